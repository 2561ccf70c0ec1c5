use validator::ValidateEmail;

/// Format check used by every invite path.
///
/// On top of `validator`'s rules the domain must be `localhost`, an address
/// literal, or dotted with a top-level label of at least two characters.
pub fn is_valid_email(email: &str) -> bool {
    if !email.validate_email() {
        return false;
    }
    let Some((_, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if domain == "localhost" || domain.starts_with('[') {
        return true;
    }

    let mut labels = domain.rsplit('.');
    let tld = labels.next().unwrap_or_default();
    let rest: Vec<&str> = labels.collect();
    !rest.is_empty()
        && rest.iter().all(|label| !label.is_empty())
        && tld.len() >= 2
        && !tld.ends_with('-')
}
