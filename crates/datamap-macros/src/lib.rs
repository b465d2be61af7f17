extern crate proc_macro;

use proc_macro::TokenStream;

/// Derives `datamap::Entity`, building the type's field accessor table.
///
/// Attributes:
///
/// * `#[datamap(name = "...")]` on the struct sets the type name matched
///   against mapping objects (defaults to the struct name).
/// * `#[datamap(rename = "...")]` on a field sets the name mappings use.
/// * `#[datamap(readonly)]` makes a field readable but not assignable.
/// * `#[datamap(skip)]` leaves a field out of the table.
#[proc_macro_derive(Entity, attributes(datamap))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    match datamap_codegen::generate(input.into()) {
        Ok(output) => output.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
