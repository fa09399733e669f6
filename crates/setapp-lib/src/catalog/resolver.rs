use super::index::CatalogIndex;
use super::types::CatalogEntry;
use crate::error::ResolutionError;
use crate::installer::types::InstallTarget;

/// Resolve one user token.
///
/// With `by_name` the token is a case-insensitive name. Otherwise it must be
/// an integer id; anything else is reported as ambiguous rather than as a
/// catalog miss.
pub fn resolve(
    token: &str,
    by_name: bool,
    index: &CatalogIndex,
) -> Result<CatalogEntry, ResolutionError> {
    if by_name {
        return index
            .find_by_name(token)
            .cloned()
            .ok_or_else(|| ResolutionError::NameNotFound(token.to_string()));
    }

    if !is_integer(token) {
        return Err(ResolutionError::AmbiguousToken(token.to_string()));
    }
    // Negative or out-of-range integers are still ids, just absent ones
    token
        .parse::<u64>()
        .ok()
        .and_then(|id| index.get(id))
        .cloned()
        .ok_or_else(|| ResolutionError::IdNotFound(token.to_string()))
}

/// Optional sign followed by ASCII digits, of any magnitude
fn is_integer(token: &str) -> bool {
    let digits = token.strip_prefix(['+', '-']).unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Resolve every token independently, in input order. Duplicates are kept.
pub fn resolve_all<S: AsRef<str>>(
    tokens: &[S],
    by_name: bool,
    index: &CatalogIndex,
) -> (Vec<InstallTarget>, Vec<ResolutionError>) {
    let mut targets = Vec::with_capacity(tokens.len());
    let mut errors = Vec::new();

    for token in tokens {
        match resolve(token.as_ref(), by_name, index) {
            Ok(entry) => {
                log::debug!("Resolved {:?} to {} ({})", token.as_ref(), entry.name, entry.id);
                targets.push(InstallTarget::from(entry));
            }
            Err(e) => {
                log::warn!("{}", e);
                errors.push(e);
            }
        }
    }

    (targets, errors)
}
