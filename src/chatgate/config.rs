//! Runtime configuration for the chat gateway.
//!
//! Everything is read from the environment; unset or unparsable variables
//! fall back to the defaults below.
//!
//! | variable | default |
//! |---|---|
//! | `CHATGATE_BIND_ADDR` | `127.0.0.1:8000` |
//! | `OPENAI_API_KEY` | unset |
//! | `OPENAI_BASE_URL` | `https://api.openai.com` |
//! | `CHATGATE_MODEL` | `gpt-4o-mini` |
//! | `CHATGATE_SESSION_DIR` | `sessions` |
//! | `CHATGATE_DEFAULT_SESSION` | `default_session` |
//! | `STUDENT_SERVICE` | `http://localhost:8080/students` |
//! | `COURSE_SERVICE` | `http://localhost:8080/courses` |
//! | `PROFESSOR_SERVICE` | `http://localhost:8080/professors` |
//! | `WEBFLUX_SERVICE` | `http://localhost:8081/products` |
//! | `JSONTOJAVA_SERVICE` | `http://localhost:8082/movies` |
//! | `CHATGATE_HTTP_TIMEOUT_SECS` | `30` |
//! | `CHATGATE_MAX_TOOL_ITERATIONS` | `5` |

use std::path::PathBuf;
use std::str::FromStr;

use crate::chatgate::agent::DEFAULT_MAX_TOOL_ITERATIONS;
use crate::chatgate::clients::openai::{DEFAULT_MODEL, OPENAI_BASE_URL};
use crate::chatgate::http_client_pool::DEFAULT_TIMEOUT_SECS;

/// Session key used when a request does not name one.
pub const DEFAULT_SESSION_ID: &str = "default_session";

/// Base URLs of the downstream microservices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoints {
    pub student: String,
    pub course: String,
    pub professor: String,
    pub webflux: String,
    pub json_to_java: String,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            student: "http://localhost:8080/students".to_string(),
            course: "http://localhost:8080/courses".to_string(),
            professor: "http://localhost:8080/professors".to_string(),
            webflux: "http://localhost:8081/products".to_string(),
            json_to_java: "http://localhost:8082/movies".to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct ChatGateConfig {
    /// Socket address the HTTP endpoint listens on.
    pub bind_addr: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub model: String,
    /// Directory holding one `.jsonl` transcript per session.
    pub session_dir: PathBuf,
    pub default_session: String,
    pub services: ServiceEndpoints,
    /// Per-request timeout for downstream service calls.
    pub http_timeout_secs: u64,
    pub max_tool_iterations: usize,
}

impl Default for ChatGateConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            openai_api_key: None,
            openai_base_url: OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            session_dir: PathBuf::from("sessions"),
            default_session: DEFAULT_SESSION_ID.to_string(),
            services: ServiceEndpoints::default(),
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        }
    }
}

impl ChatGateConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, fallback: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
        };

        let services = ServiceEndpoints {
            student: text("STUDENT_SERVICE", defaults.services.student.clone()),
            course: text("COURSE_SERVICE", defaults.services.course.clone()),
            professor: text("PROFESSOR_SERVICE", defaults.services.professor.clone()),
            webflux: text("WEBFLUX_SERVICE", defaults.services.webflux.clone()),
            json_to_java: text("JSONTOJAVA_SERVICE", defaults.services.json_to_java.clone()),
        };

        Self {
            bind_addr: text("CHATGATE_BIND_ADDR", defaults.bind_addr.clone()),
            openai_api_key: lookup("OPENAI_API_KEY").filter(|v| !v.trim().is_empty()),
            openai_base_url: text("OPENAI_BASE_URL", defaults.openai_base_url.clone()),
            model: text("CHATGATE_MODEL", defaults.model.clone()),
            session_dir: PathBuf::from(text(
                "CHATGATE_SESSION_DIR",
                defaults.session_dir.to_string_lossy().into_owned(),
            )),
            default_session: text("CHATGATE_DEFAULT_SESSION", defaults.default_session.clone()),
            services,
            http_timeout_secs: parse_or(
                lookup("CHATGATE_HTTP_TIMEOUT_SECS"),
                "CHATGATE_HTTP_TIMEOUT_SECS",
                defaults.http_timeout_secs,
            ),
            max_tool_iterations: parse_or(
                lookup("CHATGATE_MAX_TOOL_ITERATIONS"),
                "CHATGATE_MAX_TOOL_ITERATIONS",
                defaults.max_tool_iterations,
            ),
        }
    }
}

fn parse_or<T: FromStr + Copy>(raw: Option<String>, key: &str, fallback: T) -> T {
    match raw {
        None => fallback,
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                log::warn!("ignoring {}={:?}: not a valid number", key, value);
                fallback
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ChatGateConfig::from_lookup(|_| None);
        assert_eq!(config.default_session, "default_session");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.max_tool_iterations, 5);
        assert_eq!(config.services, ServiceEndpoints::default());
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let vars: HashMap<&str, &str> = [
            ("STUDENT_SERVICE", "http://students.internal/api/students"),
            ("CHATGATE_HTTP_TIMEOUT_SECS", "5"),
            ("CHATGATE_MAX_TOOL_ITERATIONS", "lots"),
            ("OPENAI_API_KEY", "  "),
            ("CHATGATE_SESSION_DIR", "/var/lib/chatgate"),
        ]
        .into_iter()
        .collect();
        let config = ChatGateConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.services.student, "http://students.internal/api/students");
        assert_eq!(config.services.course, "http://localhost:8080/courses");
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(config.max_tool_iterations, 5);
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.session_dir, PathBuf::from("/var/lib/chatgate"));
    }
}
