//! Server configuration module
//!
//! Parses and manages server configuration from YAML files. serde does the
//! parsing and type conversion; `validate()` checks the values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::console::ConsolePolicy;
use crate::permissions::RoleDef;

/// Maximum number of areas supported
pub const AREA_MAX: usize = 255;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    // ============================================
    // MySQL Database Configuration
    // ============================================
    pub sql_ip: String,

    #[serde(default = "default_sql_port")]
    pub sql_port: u16,

    pub sql_id: String,
    pub sql_pw: String,
    pub sql_db: String,

    // ============================================
    // Server Limits
    // ============================================
    /// Maximum number of concurrently connected players
    #[serde(default = "default_max_players")]
    pub max_players: usize,

    /// Log lines retained per area
    #[serde(default = "default_log_buffer_len")]
    pub log_buffer_len: usize,

    // ============================================
    // Areas & Roles
    // ============================================
    /// List of area names, created at startup
    #[serde(default)]
    pub area: Vec<String>,

    /// Moderator roles assignable with mkusr
    #[serde(default)]
    pub roles: Vec<RoleDef>,

    // ============================================
    // Operator Console
    // ============================================
    #[serde(default)]
    pub console: ConsolePolicy,
}

// ============================================
// Default value functions
// These are called by serde when a field is missing
// ============================================

fn default_sql_port() -> u16 {
    3306
}

fn default_max_players() -> usize {
    100
}

fn default_log_buffer_len() -> usize {
    500
}

impl ServerConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ServerConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML in {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from a YAML string
    ///
    /// Useful for testing
    pub fn from_str(contents: &str) -> Result<Self> {
        let config: ServerConfig =
            serde_yaml::from_str(contents).context("Failed to parse YAML")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.sql_ip.is_empty(), "sql_ip cannot be empty");
        anyhow::ensure!(!self.sql_id.is_empty(), "sql_id cannot be empty");
        anyhow::ensure!(!self.sql_db.is_empty(), "sql_db cannot be empty");

        anyhow::ensure!(self.max_players >= 1, "max_players must be at least 1");
        anyhow::ensure!(self.log_buffer_len >= 1, "log_buffer_len must be at least 1");

        anyhow::ensure!(
            self.area.len() <= AREA_MAX,
            "Too many areas: {} (max {})",
            self.area.len(),
            AREA_MAX
        );

        for (i, name) in self.area.iter().enumerate() {
            anyhow::ensure!(!name.is_empty(), "area {} has an empty name", i);
            anyhow::ensure!(
                !self.area[..i].contains(name),
                "Duplicate area name: {}",
                name
            );
        }

        for (i, role) in self.roles.iter().enumerate() {
            anyhow::ensure!(!role.name.is_empty(), "role {} has an empty name", i);
        }

        Ok(())
    }

    /// Save configuration to a YAML file
    ///
    /// Useful for generating config templates or saving modified configs
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yaml::to_string(&self).context("Failed to serialize config to YAML")?;

        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config to {}", path.as_ref().display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{ArgStyle, DuplicateUserPolicy, MissingUserPolicy};

    /// Helper to create a minimal valid config
    fn minimal_config() -> &'static str {
        r#"
sql_ip: "127.0.0.1"
sql_id: "user"
sql_pw: "pass"
sql_db: "gaveldb"
"#
    }

    #[test]
    fn test_minimal_config() {
        let config = ServerConfig::from_str(minimal_config()).unwrap();

        assert_eq!(config.sql_ip, "127.0.0.1");
        assert_eq!(config.sql_id, "user");
        assert_eq!(config.sql_pw, "pass");
        assert_eq!(config.sql_db, "gaveldb");
    }

    #[test]
    fn test_default_values() {
        let config = ServerConfig::from_str(minimal_config()).unwrap();

        assert_eq!(config.sql_port, 3306);
        assert_eq!(config.max_players, 100);
        assert_eq!(config.log_buffer_len, 500);
        assert!(config.area.is_empty());
        assert!(config.roles.is_empty());
        assert_eq!(config.console, ConsolePolicy::default());
    }

    #[test]
    fn test_areas_as_list() {
        let config_str = r#"
sql_ip: "127.0.0.1"
sql_id: "user"
sql_pw: "pass"
sql_db: "gaveldb"

area:
  - lobby
  - basement
  - courtroom
"#;

        let config = ServerConfig::from_str(config_str).unwrap();
        assert_eq!(config.area.len(), 3);
        assert_eq!(config.area[0], "lobby");
        assert_eq!(config.area[2], "courtroom");
    }

    #[test]
    fn test_roles_with_permissions() {
        let config_str = r#"
sql_ip: "127.0.0.1"
sql_id: "user"
sql_pw: "pass"
sql_db: "gaveldb"

roles:
  - name: moderator
    permissions: [hear_modcall, kick, mute]
  - name: admin
    permissions: [admin]
"#;

        let config = ServerConfig::from_str(config_str).unwrap();
        assert_eq!(config.roles.len(), 2);
        assert_eq!(config.roles[0].name, "moderator");
        assert_eq!(
            config.roles[0].permissions,
            vec!["hear_modcall", "kick", "mute"]
        );
        assert_eq!(config.roles[1].permissions, vec!["admin"]);
    }

    #[test]
    fn test_console_policy_block() {
        let config_str = r#"
sql_ip: "127.0.0.1"
sql_id: "user"
sql_pw: "pass"
sql_db: "gaveldb"

console:
  on_duplicate_user: continue
  on_missing_user: skip
  say_args: rest_of_line
"#;

        let config = ServerConfig::from_str(config_str).unwrap();
        assert_eq!(
            config.console.on_duplicate_user,
            DuplicateUserPolicy::Continue
        );
        assert_eq!(config.console.on_missing_user, MissingUserPolicy::Skip);
        assert_eq!(config.console.say_args, ArgStyle::RestOfLine);
        // unset fields keep their defaults
        assert_eq!(config.console.getlog_args, ArgStyle::SingleToken);
    }

    #[test]
    fn test_missing_required_field() {
        let config_str = r#"
sql_ip: "127.0.0.1"
sql_id: "user"
# Missing sql_pw!
sql_db: "gaveldb"
"#;

        let result = ServerConfig::from_str(config_str);
        assert!(result.is_err());

        let err_msg = format!("{:?}", result.unwrap_err());
        assert!(err_msg.contains("sql_pw") || err_msg.contains("missing field"));
    }

    #[test]
    fn test_invalid_yaml() {
        let result = ServerConfig::from_str("sql_ip: [this is not valid yaml");
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_type() {
        let config_str = r#"
sql_ip: "127.0.0.1"
sql_port: "not_a_number"
sql_id: "user"
sql_pw: "pass"
sql_db: "gaveldb"
"#;

        let result = ServerConfig::from_str(config_str);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_empty_sql_ip() {
        let config_str = r#"
sql_ip: ""
sql_id: "user"
sql_pw: "pass"
sql_db: "gaveldb"
"#;

        let result = ServerConfig::from_str(config_str);
        assert!(result.is_err());

        let err_msg = format!("{}", result.unwrap_err());
        assert!(err_msg.contains("sql_ip"));
    }

    #[test]
    fn test_validation_zero_max_players() {
        let config_str = r#"
sql_ip: "127.0.0.1"
sql_id: "user"
sql_pw: "pass"
sql_db: "gaveldb"
max_players: 0
"#;

        let result = ServerConfig::from_str(config_str);
        assert!(result.is_err());

        let err_msg = format!("{}", result.unwrap_err());
        assert!(err_msg.contains("max_players"));
    }

    #[test]
    fn test_validation_duplicate_area() {
        let config_str = r#"
sql_ip: "127.0.0.1"
sql_id: "user"
sql_pw: "pass"
sql_db: "gaveldb"
area:
  - lobby
  - lobby
"#;

        let result = ServerConfig::from_str(config_str);
        assert!(result.is_err());

        let err_msg = format!("{}", result.unwrap_err());
        assert!(err_msg.contains("Duplicate area name"));
    }

    #[test]
    fn test_too_many_areas() {
        let mut config_str = String::from(minimal_config());
        config_str.push_str("\narea:\n");

        for i in 0..(AREA_MAX + 1) {
            config_str.push_str(&format!("  - area{}\n", i));
        }

        let result = ServerConfig::from_str(&config_str);
        assert!(result.is_err());

        let err_msg = format!("{}", result.unwrap_err());
        assert!(err_msg.contains("Too many areas"));
    }

    #[test]
    fn test_full_config() {
        let config_str = r#"
# Full server configuration
sql_ip: "192.168.1.2"
sql_port: 3306
sql_id: "gameuser"
sql_pw: "gamepass"
sql_db: "gaveldb"

max_players: 64
log_buffer_len: 200

area:
  - lobby
  - basement

roles:
  - name: moderator
    permissions: [kick, mute]
  - name: admin
    permissions: [admin]

console:
  on_duplicate_user: abort_console
  on_missing_user: attempt_removal
  say_args: single_token
  getlog_args: single_token
"#;

        let config = ServerConfig::from_str(config_str).unwrap();

        assert_eq!(config.sql_ip, "192.168.1.2");
        assert_eq!(config.max_players, 64);
        assert_eq!(config.log_buffer_len, 200);
        assert_eq!(config.area.len(), 2);
        assert_eq!(config.roles.len(), 2);
        assert_eq!(config.console, ConsolePolicy::default());
    }

    #[test]
    fn test_save_and_load() {
        let config = ServerConfig::from_str(minimal_config()).unwrap();

        let temp_file = std::env::temp_dir().join("test_save_gavel_config.yaml");

        config.save(&temp_file).unwrap();

        let loaded = ServerConfig::from_file(&temp_file).unwrap();

        assert_eq!(config.sql_ip, loaded.sql_ip);
        assert_eq!(config.sql_db, loaded.sql_db);
        assert_eq!(config.max_players, loaded.max_players);

        std::fs::remove_file(temp_file).ok();
    }
}
