use std::env;
use std::str::FromStr;
use eventyay_attendees::eventyay::EVENTYAY_BASE_URL;

#[derive(Debug, Fail, PartialEq)]
pub enum ConfigError {
    #[fail(display = "{} is mandatory", name)]
    Missing { name: &'static str },
    #[fail(display = "invalid value {:?} for {}", value, name)]
    Invalid { name: &'static str, value: String }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub event_id: u64,
    pub checked_in_only: bool,
    pub page_size: Option<u32>,
    /// Seconds between two forced reloads.
    pub refresh_interval: u64,
    pub bind_address: String,
    pub fetch_workers: usize
}

fn parse<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid { name, value })
}

impl HostConfig {
    pub fn from_env() -> Result<HostConfig, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Blank values count as absent.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<HostConfig, ConfigError> {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let optional = |name: &'static str| lookup(name).map(|value| (name, value));

        let event_id = match optional("EVENT_ID") {
            Some((name, value)) => parse(name, value)?,
            None => return Err(ConfigError::Missing { name: "EVENT_ID" })
        };
        let checked_in_only = match optional("CHECKED_IN_ONLY") {
            Some((name, value)) => parse(name, value)?,
            None => false
        };
        let page_size = match optional("PAGE_SIZE") {
            Some((name, value)) => match parse::<u32>(name, value)? {
                0 => None,
                page_size => Some(page_size)
            },
            None => None
        };
        let refresh_interval = match optional("REFRESH_INTERVAL") {
            Some((name, value)) => match parse::<u64>(name, value.clone())? {
                0 => return Err(ConfigError::Invalid { name, value }),
                seconds => seconds
            },
            None => 30
        };
        let fetch_workers = match optional("FETCH_WORKERS") {
            Some((name, value)) => parse(name, value)?,
            None => 2
        };

        Ok(HostConfig {
            api_url: lookup("EVENTYAY_API_URL").unwrap_or_else(|| EVENTYAY_BASE_URL.to_owned()),
            token: lookup("EVENTYAY_TOKEN"),
            event_id,
            checked_in_only,
            page_size,
            refresh_interval,
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:8088".to_owned()),
            fetch_workers
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(values: Vec<(&str, &str)>) -> Result<HostConfig, ConfigError> {
        let values: HashMap<String, String> = values.into_iter().map(|(name, value)| (name.to_owned(), value.to_owned())).collect();
        HostConfig::from_lookup(|name| values.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let actual = config(vec![("EVENT_ID", "5")]).unwrap();
        assert_eq!(actual, HostConfig {
            api_url: EVENTYAY_BASE_URL.to_owned(),
            token: None,
            event_id: 5,
            checked_in_only: false,
            page_size: None,
            refresh_interval: 30,
            bind_address: "127.0.0.1:8088".to_owned(),
            fetch_workers: 2
        });
    }

    #[test]
    fn test_all_values() {
        let actual = config(vec![
            ("EVENT_ID", "12"),
            ("EVENTYAY_API_URL", "http://localhost:5000"),
            ("EVENTYAY_TOKEN", "secret"),
            ("CHECKED_IN_ONLY", "true"),
            ("PAGE_SIZE", "20"),
            ("REFRESH_INTERVAL", "10"),
            ("BIND_ADDRESS", "0.0.0.0:9000"),
            ("FETCH_WORKERS", "4")
        ]).unwrap();
        assert_eq!(actual.event_id, 12);
        assert_eq!(actual.api_url, "http://localhost:5000");
        assert_eq!(actual.token, Some("secret".to_owned()));
        assert!(actual.checked_in_only);
        assert_eq!(actual.page_size, Some(20));
        assert_eq!(actual.refresh_interval, 10);
        assert_eq!(actual.bind_address, "0.0.0.0:9000");
        assert_eq!(actual.fetch_workers, 4);
    }

    #[test]
    fn test_event_id_is_mandatory() {
        assert_eq!(config(vec![]), Err(ConfigError::Missing { name: "EVENT_ID" }));
        assert_eq!(config(vec![("EVENT_ID", "  ")]), Err(ConfigError::Missing { name: "EVENT_ID" }));
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(config(vec![("EVENT_ID", "five")]), Err(ConfigError::Invalid { name: "EVENT_ID", value: "five".to_owned() }));
        assert_eq!(config(vec![("EVENT_ID", "5"), ("CHECKED_IN_ONLY", "yes")]),
                   Err(ConfigError::Invalid { name: "CHECKED_IN_ONLY", value: "yes".to_owned() }));
        assert_eq!(config(vec![("EVENT_ID", "5"), ("REFRESH_INTERVAL", "0")]),
                   Err(ConfigError::Invalid { name: "REFRESH_INTERVAL", value: "0".to_owned() }));
    }

    #[test]
    fn test_zero_page_size_loads_everything() {
        assert_eq!(config(vec![("EVENT_ID", "5"), ("PAGE_SIZE", "0")]).unwrap().page_size, None);
    }
}
