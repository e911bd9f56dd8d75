pub mod adapter;
pub mod error;
pub mod mysql;
pub mod postgres;
pub mod query;
pub mod row;
pub mod source;

/// Hide the password part of a connection URL before it reaches the logs.
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((userinfo, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
        None => url.to_string(),
    }
}
