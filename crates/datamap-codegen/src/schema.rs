mod entity_attr;
use entity_attr::EntityAttr;

mod error;
use error::ErrorSet;

mod field;
pub(crate) use field::Field;

#[derive(Debug)]
pub(crate) struct Entity {
    /// The struct the entity is derived for
    pub(crate) ident: syn::Ident,

    /// Name matched against mapping objects
    pub(crate) name: String,

    /// Mapped fields, in declaration order. Skipped fields are left out.
    pub(crate) fields: Vec<Field>,
}

impl Entity {
    pub(crate) fn from_ast(ast: &syn::ItemStruct) -> syn::Result<Self> {
        if !ast.generics.params.is_empty() {
            return Err(syn::Error::new_spanned(
                &ast.generics,
                "entity types cannot have generic parameters",
            ));
        }

        let syn::Fields::Named(named) = &ast.fields else {
            return Err(syn::Error::new_spanned(
                &ast.fields,
                "entity types must be structs with named fields",
            ));
        };

        let mut errs = ErrorSet::default();

        let attr = errs
            .check(EntityAttr::from_ast(&ast.attrs))
            .unwrap_or_default();

        let mut fields: Vec<Field> = vec![];
        for field in &named.named {
            let Some(field) = errs.check(Field::from_ast(field)).flatten() else {
                continue;
            };

            if fields.iter().any(|f| f.name == field.name) {
                errs.push(syn::Error::new_spanned(
                    &field.ident,
                    format!("duplicate entity field name `{}`", field.name),
                ));
                continue;
            }

            fields.push(field);
        }

        errs.finish()?;

        Ok(Entity {
            name: attr.name.unwrap_or_else(|| ast.ident.to_string()),
            ident: ast.ident.clone(),
            fields,
        })
    }
}
