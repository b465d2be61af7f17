//! Source selection for a single call.

use crate::Result;

use datamap_core::{
    schema::{Continuation, MappingRef, Routing, Source},
    Error,
};

/// The ordered list of sources a call may be served by.
///
/// Built fresh for every call. The first candidate is the active source;
/// later ones are only tried when the previous candidate's continuation
/// policy allows it.
#[derive(Debug, Clone)]
pub struct Route<'a> {
    candidates: Vec<Candidate<'a>>,
}

/// A source a call may be routed to.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    /// Registry identifier, `namespace.source`
    pub id: String,

    /// Source name within its namespace
    pub name: &'a str,

    pub source: &'a Source,

    /// Continue with the next candidate when this one has no match
    pub on_miss: Continuation,

    /// Continue with the next candidate when this one fails
    pub on_error: Continuation,
}

impl<'a> Route<'a> {
    /// Picks the sources for `target` (an operation or action name) of a
    /// mapping. First matching rule wins:
    ///
    /// 1. the explicit `source` override, alone;
    /// 2. the `sources` fallback chain, in order, without repeats;
    /// 3. the mapping's default source.
    pub fn resolve<R: Routing>(mapping: MappingRef<'a>, target: &str, routing: &'a R) -> Result<Route<'a>> {
        let referrer = || format!("{}.{}", mapping.qualified_name(), target);

        if let Some(name) = routing.source_override() {
            return Ok(Route {
                candidates: vec![Candidate::lookup(mapping, name, referrer())?],
            });
        }

        let chain = routing.fallback_chain();
        if !chain.is_empty() {
            let mut candidates: Vec<Candidate<'a>> = Vec::with_capacity(chain.len());

            for entry in chain {
                if candidates.iter().any(|c| c.name == entry.name) {
                    continue;
                }

                let mut candidate = Candidate::lookup(mapping, &entry.name, referrer())?;
                candidate.on_miss = entry.on_miss;
                candidate.on_error = entry.on_error;
                candidates.push(candidate);
            }

            return Ok(Route { candidates });
        }

        match mapping.mapping.source.as_deref() {
            Some(name) => Ok(Route {
                candidates: vec![Candidate::lookup(mapping, name, mapping.qualified_name())?],
            }),
            None => Err(Error::no_source_configured(mapping.qualified_name(), target)),
        }
    }

    /// A route with a single named source.
    pub fn single(mapping: MappingRef<'a>, name: &'a str, referrer: String) -> Result<Route<'a>> {
        Ok(Route {
            candidates: vec![Candidate::lookup(mapping, name, referrer)?],
        })
    }

    /// The source a call starts with.
    pub fn primary(&self) -> &Candidate<'a> {
        &self.candidates[0]
    }

    pub fn candidates(&self) -> &[Candidate<'a>] {
        &self.candidates
    }
}

impl<'a> Candidate<'a> {
    fn lookup(mapping: MappingRef<'a>, name: &str, referrer: String) -> Result<Candidate<'a>> {
        let (name, source) = mapping
            .config
            .sources
            .get_key_value(name)
            .ok_or_else(|| Error::unknown_source(name, referrer))?;

        Ok(Candidate {
            id: mapping.source_id(name),
            name,
            source,
            on_miss: Continuation::Stop,
            on_error: Continuation::Stop,
        })
    }

    /// Whether a miss on this candidate moves on to the next one.
    pub fn continues_on_miss(&self) -> bool {
        self.on_miss == Continuation::Next
    }

    /// Whether a failure on this candidate moves on to the next one.
    pub fn continues_on_error(&self) -> bool {
        self.on_error == Continuation::Next
    }
}
