//! One-shot user messages carried across a redirect in the query string.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Danger,
    Warning,
}

impl FlashLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Danger => "danger",
            Self::Warning => "warning",
        }
    }

    fn parse(level: &str) -> Self {
        match level {
            "warning" => Self::Warning,
            _ => Self::Danger,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Danger,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Warning,
            message: message.into(),
        }
    }

    /// Collapses several messages into one; the most severe level wins.
    pub fn combine(flashes: &[Flash]) -> Option<Flash> {
        if flashes.is_empty() {
            return None;
        }
        let level = if flashes.iter().any(|f| f.level == FlashLevel::Danger) {
            FlashLevel::Danger
        } else {
            FlashLevel::Warning
        };
        let message = flashes
            .iter()
            .map(|f| f.message.as_str())
            .collect::<Vec<_>>()
            .join(" | ");
        Some(Flash { level, message })
    }

    /// `target` with `flash` and `level` query parameters appended.
    pub fn location(&self, target: &str) -> String {
        let separator = if target.contains('?') { '&' } else { '?' };
        format!(
            "{}{}flash={}&level={}",
            target,
            separator,
            urlencoding::encode(&self.message),
            self.level.as_str()
        )
    }
}

/// Query parameters a page reads its flash from.
#[derive(Debug, Default, Deserialize)]
pub struct FlashQuery {
    pub flash: Option<String>,
    pub level: Option<String>,
}

impl FlashQuery {
    pub fn into_flash(self) -> Option<Flash> {
        let message = self.flash.filter(|m| !m.is_empty())?;
        Some(Flash {
            level: FlashLevel::parse(self.level.as_deref().unwrap_or_default()),
            message,
        })
    }
}

/// A 303 redirect, optionally carrying a flash message.
#[derive(Debug)]
pub struct Redirect {
    target: String,
    flash: Option<Flash>,
    cookie: Option<String>,
}

impl Redirect {
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            flash: None,
            cookie: None,
        }
    }

    pub fn with_flash(mut self, flash: Flash) -> Self {
        self.flash = Some(flash);
        self
    }

    pub fn with_optional_flash(mut self, flash: Option<Flash>) -> Self {
        self.flash = flash;
        self
    }

    /// Adds a `Set-Cookie` header value.
    pub fn with_cookie(mut self, cookie: String) -> Self {
        self.cookie = Some(cookie);
        self
    }

    pub fn location(&self) -> String {
        match &self.flash {
            Some(flash) => flash.location(&self.target),
            None => self.target.clone(),
        }
    }
}

impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        let location = self.location();
        match self.cookie {
            Some(cookie) => (
                StatusCode::SEE_OTHER,
                [(header::LOCATION, location), (header::SET_COOKIE, cookie)],
            )
                .into_response(),
            None => (StatusCode::SEE_OTHER, [(header::LOCATION, location)]).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_encodes_message() {
        let flash = Flash::danger("Results not found. Please try again & retry");
        assert_eq!(
            flash.location("/"),
            "/?flash=Results%20not%20found.%20Please%20try%20again%20%26%20retry&level=danger"
        );
        assert!(Flash::warning("x").location("/results?a=1").starts_with("/results?a=1&flash="));
    }

    #[test]
    fn test_combine_prefers_danger() {
        let combined = Flash::combine(&[Flash::warning("a"), Flash::danger("b")]).unwrap();
        assert_eq!(combined.level, FlashLevel::Danger);
        assert_eq!(combined.message, "a | b");

        let combined = Flash::combine(&[Flash::warning("only")]).unwrap();
        assert_eq!(combined.level, FlashLevel::Warning);

        assert!(Flash::combine(&[]).is_none());
    }

    #[test]
    fn test_query_into_flash() {
        let query = FlashQuery {
            flash: Some("hello".to_string()),
            level: Some("warning".to_string()),
        };
        assert_eq!(query.into_flash(), Some(Flash::warning("hello")));
        assert!(FlashQuery::default().into_flash().is_none());
    }

    #[test]
    fn test_redirect_is_see_other() {
        let response = Redirect::to("/results")
            .with_flash(Flash::danger("nope"))
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/results?flash=nope&level=danger"
        );
    }
}
