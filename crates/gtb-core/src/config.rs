use std::{env, fs, path::Path, path::PathBuf, time::Duration};

use crate::{errors::Error, Result};

/// Typed configuration for the bot.
///
/// All pipeline knobs are plain numeric settings with conservative defaults;
/// the platform imposes flood control per credential, so the defaults err on
/// the slow side.
#[derive(Clone, Debug)]
pub struct Config {
    // Bot API
    pub bot_token: String,
    /// User ids seeded into the admin store on first load.
    pub admin_ids: Vec<i64>,
    /// Username shown to non-admins asking for access.
    pub admin_contact: String,

    // Persistence
    pub admin_store_path: PathBuf,

    // Pipeline pacing
    pub transfer_delay: Duration,
    pub page_delay: Duration,
    pub flood_wait_ceiling: Duration,
    pub page_size: usize,
    pub progress_interval: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let bot_token = env_str("BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(Error::Config(
                "BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let admin_ids = parse_csv_i64(env_str("ADMIN_IDS"));
        let admin_contact = env_str("ADMIN_CONTACT")
            .and_then(non_empty)
            .unwrap_or_else(|| "@thegodoftgbot".to_string());

        let admin_store_path = PathBuf::from(
            env_str("ADMIN_STORE_PATH").unwrap_or_else(|| "gtb-admins.json".to_string()),
        );

        let transfer_delay = Duration::from_secs(env_u64("TRANSFER_DELAY").unwrap_or(10));
        let page_delay = Duration::from_secs(env_u64("PAGE_DELAY").unwrap_or(1));
        let flood_wait_ceiling =
            Duration::from_secs(env_u64("FLOOD_WAIT_THRESHOLD").unwrap_or(3600));
        let page_size = env_usize("PAGE_SIZE").unwrap_or(100).max(1);
        let progress_interval = env_usize("PROGRESS_INTERVAL").unwrap_or(10).max(1);

        Ok(Self {
            bot_token,
            admin_ids,
            admin_contact,
            admin_store_path,
            transfer_delay,
            page_delay,
            flood_wait_ceiling,
            page_size,
            progress_interval,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_ids() {
        let ids = parse_csv_i64(Some(" 1, 2 ,,abc, 333 ".to_string()));
        assert_eq!(ids, vec![1, 2, 333]);
        assert!(parse_csv_i64(None).is_empty());
    }

    #[test]
    fn non_empty_filters_blank_strings() {
        assert_eq!(non_empty("  ".to_string()), None);
        assert_eq!(non_empty("x".to_string()), Some("x".to_string()));
    }
}
