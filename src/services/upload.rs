use std::{
    io::{Cursor, Read},
    path::Path,
};

use tracing::{debug, info};

use crate::{
    adapter::{
        fs::LocalFile,
        ssh::{
            transfer::{send_file, FileHeader},
            Connector, RemoteSession,
        },
    },
    config::Settings,
    error::{Error, Result},
    template::{render, TemplateError, TemplateVars},
    util::base_name,
};

/// Bytes to put on the wire and how many of them there are.
enum Payload<'f> {
    Raw { file: &'f LocalFile },
    Rendered(String),
}

impl<'f> Payload<'f> {
    fn prepare(source: &'f LocalFile, templating: bool, vars: &TemplateVars) -> Result<Self> {
        if !templating {
            return Ok(Payload::Raw { file: source });
        }

        let mut text = String::new();
        source
            .file()
            .read_to_string(&mut text)
            .map_err(|err| Error::TemplateParse(TemplateError::Read(err)))?;

        debug!(variables = vars.len(), "rendering template");
        Ok(Payload::Rendered(render(&text, vars)?))
    }

    fn size(&self) -> u64 {
        match self {
            Payload::Raw { file } => file.size(),
            Payload::Rendered(text) => text.len() as u64,
        }
    }

    fn into_reader(self) -> Box<dyn Read + 'f> {
        match self {
            Payload::Raw { file } => Box::new(file.file()),
            Payload::Rendered(text) => Box::new(Cursor::new(text.into_bytes())),
        }
    }
}

/// Uploads `settings.source` to `settings.target` on `settings.address`.
///
/// `settings` must already be validated. The session, channel and local file
/// are all released when this returns, whichever step failed.
pub fn upload<C: Connector>(connector: &C, settings: &Settings, vars: &TemplateVars) -> Result<()> {
    info!("Connecting to {}", settings.address);

    let session = connector
        .connect(&settings.address, &settings.username, settings.auth_methods())
        .map_err(|source| Error::Connection {
            address: settings.address.clone(),
            source,
        })?;

    let mut channel = session.open_channel().map_err(Error::Session)?;

    info!("Copying file: {}", settings.source);

    let source = LocalFile::open(Path::new(&settings.source))?;
    let payload = Payload::prepare(&source, settings.templating, vars)?;

    let name = base_name(&settings.source);
    let header = FileHeader {
        mode: source.mode(),
        size: payload.size(),
        name: &name,
    };

    let sent = send_file(
        &mut channel,
        &settings.target,
        &header,
        &mut payload.into_reader(),
    )
    .map_err(Error::Transfer)?;

    debug!(bytes = sent, target = %settings.target, "upload finished");

    Ok(())
}
