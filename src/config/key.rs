use pkcs8::{
    der::{asn1::ObjectIdentifier, pem},
    DecodePrivateKey, PrivateKeyInfo, SecretDocument,
};
use rsa::{pkcs1::DecodeRsaPrivateKey, RsaPrivateKey};
use ssh_key::PrivateKey;

const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("no PEM armor found")]
    NotPem(#[source] pem::Error),

    #[error("unsupported key type {0:?}")]
    UnsupportedLabel(String),

    #[error("unsupported PKCS#8 key algorithm {0}")]
    UnsupportedAlgorithm(ObjectIdentifier),

    #[error("passphrase protected keys are not supported")]
    Encrypted,

    #[error("malformed PKCS#1 RSA key")]
    Pkcs1(#[from] rsa::pkcs1::Error),

    #[error("malformed SEC1 EC key")]
    Sec1(#[from] p256::elliptic_curve::Error),

    #[error("malformed PKCS#8 key")]
    Pkcs8(#[from] pkcs8::Error),

    #[error("malformed PKCS#8 document")]
    Der(#[from] pkcs8::der::Error),

    #[error(transparent)]
    OpenSsh(#[from] ssh_key::Error),
}

/// Private key text that has been fully decoded and is usable for public key
/// auth.
///
/// The PEM text itself is what the transport consumes, so it is kept verbatim.
#[derive(Clone, PartialEq, Eq)]
pub struct ParsedKey {
    pem: String,
    algorithm: &'static str,
}

impl ParsedKey {
    pub fn pem(&self) -> &str {
        &self.pem
    }

    pub fn algorithm(&self) -> &str {
        self.algorithm
    }
}

impl std::fmt::Debug for ParsedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Decodes an OpenSSH, PKCS#1, SEC1 or PKCS#8 private key.
pub fn parse_private_key(text: &str) -> Result<ParsedKey, KeyError> {
    let text = text.trim();
    let label = pem::decode_label(text.as_bytes()).map_err(KeyError::NotPem)?;

    // RFC 1421 headers are only emitted for encrypted legacy keys
    if text.contains("Proc-Type: 4,ENCRYPTED") || label == "ENCRYPTED PRIVATE KEY" {
        return Err(KeyError::Encrypted);
    }

    let algorithm = match label {
        "OPENSSH PRIVATE KEY" => {
            let key = PrivateKey::from_openssh(text)?;
            if key.is_encrypted() {
                return Err(KeyError::Encrypted);
            }
            openssh_algorithm(&key)
        }
        "RSA PRIVATE KEY" => {
            RsaPrivateKey::from_pkcs1_pem(text)?;
            "ssh-rsa"
        }
        "EC PRIVATE KEY" => match p256::SecretKey::from_sec1_pem(text) {
            Ok(_) => "ecdsa-sha2-nistp256",
            Err(_) => {
                p384::SecretKey::from_sec1_pem(text)?;
                "ecdsa-sha2-nistp384"
            }
        },
        "PRIVATE KEY" => pkcs8_algorithm(text)?,
        other => return Err(KeyError::UnsupportedLabel(other.to_string())),
    };

    Ok(ParsedKey {
        pem: format!("{text}\n"),
        algorithm,
    })
}

fn openssh_algorithm(key: &PrivateKey) -> &'static str {
    match key.algorithm() {
        ssh_key::Algorithm::Ed25519 => "ssh-ed25519",
        ssh_key::Algorithm::Rsa { .. } => "ssh-rsa",
        ssh_key::Algorithm::Dsa => "ssh-dss",
        ssh_key::Algorithm::Ecdsa { .. } => "ecdsa",
        _ => "openssh",
    }
}

fn pkcs8_algorithm(text: &str) -> Result<&'static str, KeyError> {
    let (_, document) = SecretDocument::from_pem(text)?;
    let der = document.as_bytes();
    let info = PrivateKeyInfo::try_from(der)?;

    let oid = info.algorithm.oid;
    if oid == RSA_ENCRYPTION {
        RsaPrivateKey::from_pkcs8_der(der)?;
        Ok("ssh-rsa")
    } else if oid == EC_PUBLIC_KEY {
        match p256::SecretKey::from_pkcs8_der(der) {
            Ok(_) => Ok("ecdsa-sha2-nistp256"),
            Err(_) => {
                p384::SecretKey::from_pkcs8_der(der)?;
                Ok("ecdsa-sha2-nistp384")
            }
        }
    } else if oid == ED25519 {
        ed25519_dalek::SigningKey::from_pkcs8_der(der)?;
        Ok("ssh-ed25519")
    } else {
        Err(KeyError::UnsupportedAlgorithm(oid))
    }
}
