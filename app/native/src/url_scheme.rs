//! `plash://` URL commands.
//!
//! Both the hierarchical form (`plash://add?url=…`) and the opaque form
//! (`plash:add?url=…`) are accepted.

use thiserror::Error;
use url::Url;

use crate::app::AppCommand;
use crate::constants::URL_SCHEME;

/// Why a `plash://` URL could not be turned into a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlSchemeError {
    #[error("'{0}' is not a valid URL")]
    Malformed(String),
    #[error("expected a {URL_SCHEME}:// URL, got '{0}:'")]
    WrongScheme(String),
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("missing required parameter '{0}'")]
    MissingParameter(&'static str),
}

/// Parses a `plash://` URL into the command it names.
///
/// # Errors
///
/// Returns a [`UrlSchemeError`] for other schemes, unknown commands, or an
/// `add` without a `url` parameter. The website URL itself is validated
/// when the command runs.
pub fn parse_command_url(input: &str) -> Result<AppCommand, UrlSchemeError> {
    let url = Url::parse(input.trim()).map_err(|_| UrlSchemeError::Malformed(input.to_string()))?;

    if !url.scheme().eq_ignore_ascii_case(URL_SCHEME) {
        return Err(UrlSchemeError::WrongScheme(url.scheme().to_string()));
    }

    let name = command_name(&url);
    match name.as_str() {
        "add" => {
            let website = query_param(&url, "url")
                .filter(|value| !value.trim().is_empty())
                .ok_or(UrlSchemeError::MissingParameter("url"))?;
            let title = query_param(&url, "title").filter(|value| !value.trim().is_empty());
            Ok(AppCommand::Add { url: website, title })
        }
        "reload" => Ok(AppCommand::Reload),
        "next" => Ok(AppCommand::Next),
        "previous" => Ok(AppCommand::Previous),
        "random" => Ok(AppCommand::Random),
        "toggle-browsing-mode" => Ok(AppCommand::ToggleBrowsingMode),
        _ => Err(UrlSchemeError::UnknownCommand(name)),
    }
}

/// The command is the host in `plash://add` and the path in `plash:add`.
fn command_name(url: &Url) -> String {
    let name = match url.host_str() {
        Some(host) if !host.is_empty() => host,
        _ => url.path().trim_matches('/'),
    };
    name.to_ascii_lowercase()
}

fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs().find(|(k, _)| k == key).map(|(_, v)| v.into_owned())
}
