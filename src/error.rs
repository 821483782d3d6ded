use std::{fmt::Display, io};

use crate::{adapter::ssh::transfer::ScpError, config::key::KeyError, template::TemplateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Address,
    Username,
    Source,
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Address => write!(f, "address"),
            Field::Username => write!(f, "username"),
            Field::Source => write!(f, "source file"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no scp {0} provided")]
    MissingField(Field),

    #[error("no scp password or key provided")]
    MissingCredential,

    #[error("error while parsing private key")]
    InvalidKey(#[source] KeyError),

    #[error("error while connecting to {address}")]
    Connection {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("error while opening new session")]
    Session(#[source] io::Error),

    #[error("error while opening file")]
    FileOpen(#[source] io::Error),

    #[error("error while stating file")]
    FileStat(#[source] io::Error),

    #[error("error while parsing template file")]
    TemplateParse(#[source] TemplateError),

    #[error("error while executing template")]
    TemplateExec(#[source] minijinja::Error),

    #[error("error while copying file")]
    Transfer(#[source] ScpError),
}

pub type Result<T> = std::result::Result<T, Error>;
