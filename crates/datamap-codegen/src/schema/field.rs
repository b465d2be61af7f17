use syn::spanned::Spanned;

#[derive(Debug)]
pub(crate) struct Field {
    /// The struct field
    pub(crate) ident: syn::Ident,

    /// Field name used by mappings, the ident unless renamed
    pub(crate) name: String,

    /// Field can be read but not assigned from a record
    pub(crate) readonly: bool,
}

impl Field {
    /// Returns `None` for fields marked `#[datamap(skip)]`.
    pub(super) fn from_ast(field: &syn::Field) -> syn::Result<Option<Self>> {
        let Some(ident) = &field.ident else {
            return Err(syn::Error::new(field.span(), "entity fields must be named"));
        };

        let mut rename = None;
        let mut readonly = false;
        let mut skip = false;

        for attr in field.attrs.iter().filter(|a| a.path().is_ident("datamap")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let lit: syn::LitStr = meta.value()?.parse()?;
                    if lit.value().is_empty() {
                        return Err(syn::Error::new_spanned(lit, "field name cannot be empty"));
                    }
                    rename = Some(lit.value());
                } else if meta.path.is_ident("readonly") {
                    readonly = true;
                } else if meta.path.is_ident("skip") {
                    skip = true;
                } else {
                    return Err(meta.error(
                        "unsupported field attribute; expected `rename`, `readonly` or `skip`",
                    ));
                }
                Ok(())
            })?;
        }

        if skip {
            return Ok(None);
        }

        let name = rename.unwrap_or_else(|| {
            let name = ident.to_string();
            name.strip_prefix("r#").map(str::to_string).unwrap_or(name)
        });

        Ok(Some(Field {
            ident: ident.clone(),
            name,
            readonly,
        }))
    }
}
