#[derive(Debug, Default)]
pub(super) struct EntityAttr {
    /// `#[datamap(name = "...")]`
    pub(super) name: Option<String>,
}

impl EntityAttr {
    pub(super) fn from_ast(attrs: &[syn::Attribute]) -> syn::Result<Self> {
        let mut attr = EntityAttr::default();

        for a in attrs.iter().filter(|a| a.path().is_ident("datamap")) {
            a.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    if attr.name.is_some() {
                        return Err(meta.error("duplicate `name` attribute"));
                    }

                    let lit: syn::LitStr = meta.value()?.parse()?;
                    attr.name = Some(lit.value());
                    Ok(())
                } else {
                    Err(meta.error("unsupported entity attribute; expected `name = \"...\"`"))
                }
            })?;
        }

        Ok(attr)
    }
}
