use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    error::{Error, Field},
    util::base_name,
};

pub mod cli;
pub mod key;

use key::{parse_private_key, ParsedKey};

pub const DEFAULT_SCP_PORT: u16 = 22;

pub fn read_config(path: &Path) -> Result<Settings> {
    let file = File::open(path)
        .with_context(|| format!("could not open config file {}", path.display()))?;
    let reader = BufReader::new(file);

    serde_yaml::from_reader(reader)
        .with_context(|| format!("could not parse config file {}", path.display()))
}

/// Credential handed to the transport, in the order it should be offered.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMethod {
    Password(String),
    PublicKey(ParsedKey),
}

impl AuthMethod {
    pub fn name(&self) -> &'static str {
        match self {
            AuthMethod::Password(_) => "password",
            AuthMethod::PublicKey(_) => "publickey",
        }
    }
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMethod::Password(_) => f.write_str("Password(..)"),
            AuthMethod::PublicKey(key) => f.debug_tuple("PublicKey").field(key).finish(),
        }
    }
}

#[derive(Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub address: String,

    pub username: String,
    pub password: String,
    pub key: String,

    pub source: String,
    pub target: String,

    pub templating: bool,

    #[serde(skip)]
    auth: Vec<AuthMethod>,
}

impl Settings {
    /// Checks required fields, fills in the port and target defaults and turns
    /// the password and key into [`AuthMethod`]s.
    ///
    /// Runs once per instance: calling it again appends the credentials a
    /// second time.
    pub fn validate(&mut self) -> Result<(), Error> {
        if self.address.is_empty() {
            return Err(Error::MissingField(Field::Address));
        }

        if self.username.is_empty() {
            return Err(Error::MissingField(Field::Username));
        }

        if self.password.is_empty() && self.key.is_empty() {
            return Err(Error::MissingCredential);
        }

        if self.source.is_empty() {
            return Err(Error::MissingField(Field::Source));
        }

        if !self.address.contains(':') {
            self.address = format!("{}:{}", self.address, DEFAULT_SCP_PORT);
        }

        if !self.password.is_empty() {
            self.auth.push(AuthMethod::Password(self.password.clone()));
        }

        if !self.key.is_empty() {
            let key = parse_private_key(&self.key).map_err(Error::InvalidKey)?;
            self.auth.push(AuthMethod::PublicKey(key));
        }

        if self.target.is_empty() {
            self.target = base_name(&self.source);
        }

        Ok(())
    }

    pub fn auth_methods(&self) -> &[AuthMethod] {
        &self.auth
    }

    /// Overlays every non-empty field of `other` on top of `self`.
    pub fn merge(mut self, other: Settings) -> Self {
        macro_rules! take_non_empty {
            ($($field: ident),*) => {
                $(
                    if !other.$field.is_empty() {
                        self.$field = other.$field;
                    }
                )*
            };
        }

        take_non_empty!(address, username, password, key, source, target);
        self.templating |= other.templating;

        self
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(value: &str) -> &'static str {
            if value.is_empty() {
                ""
            } else {
                "<redacted>"
            }
        }

        f.debug_struct("Settings")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("key", &redact(&self.key))
            .field("source", &self.source)
            .field("target", &self.target)
            .field("templating", &self.templating)
            .field(
                "auth",
                &self.auth.iter().map(AuthMethod::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
