use crate::schema::Entity;

use proc_macro2::TokenStream;
use quote::quote;

pub(super) fn entity(entity: &Entity) -> TokenStream {
    let datamap = quote!(_datamap::codegen_support);
    let ident = &entity.ident;
    let name = &entity.name;

    let fields = entity.fields.iter().map(|field| {
        let field_ident = &field.ident;
        let field_name = &field.name;

        if field.readonly {
            quote! {
                .readonly(#field_name, |target: &#ident| &target.#field_ident)
            }
        } else {
            quote! {
                .field(
                    #field_name,
                    |target: &#ident| &target.#field_ident,
                    |target: &mut #ident| &mut target.#field_ident,
                )
            }
        }
    });

    wrap_in_const(quote! {
        impl #datamap::Entity for #ident {
            const NAME: &'static str = #name;

            fn shape() -> &'static #datamap::Shape<Self> {
                static SHAPE: #datamap::OnceLock<#datamap::Shape<#ident>> = #datamap::OnceLock::new();

                SHAPE.get_or_init(|| {
                    #datamap::Shape::builder(#name)
                        #( #fields )*
                        .build()
                })
            }
        }
    })
}

fn wrap_in_const(code: TokenStream) -> TokenStream {
    quote! {
        const _: () = {
            use datamap as _datamap;
            #code
        };
    }
}
