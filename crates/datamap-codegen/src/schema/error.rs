/// Collects every attribute error of an item so they are all reported in
/// one compile.
#[derive(Debug, Default)]
pub(crate) struct ErrorSet {
    errors: Vec<syn::Error>,
}

impl ErrorSet {
    pub(crate) fn push(&mut self, err: syn::Error) {
        self.errors.push(err);
    }

    pub(crate) fn check<T>(&mut self, result: syn::Result<T>) -> Option<T> {
        result.map_err(|err| self.push(err)).ok()
    }

    pub(crate) fn finish(self) -> syn::Result<()> {
        match self.errors.into_iter().reduce(|mut acc, err| {
            acc.combine(err);
            acc
        }) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
