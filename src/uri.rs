use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::{
    config::{TotpConfig, DEFAULT_ISSUER},
    OtpError, OtpHashAlgorithm, Secret, Totp,
};

const SCHEME: &str = "otpauth";
const TOTP_TYPE: &str = "totp";

const URI_SECRET_QUERY: &str = "secret";
const URI_ISSUER_QUERY: &str = "issuer";
const URI_HASH_QUERY: &str = "algorithm";
const URI_DIGITS_QUERY: &str = "digits";
const URI_PERIOD_QUERY: &str = "period";

// Same set as JavaScript's encodeURIComponent
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Generates a fresh random secret and returns its base32 form, ready to be
/// stored by the caller and embedded in a provisioning URI.
pub fn generate_secret() -> Result<String, OtpError> {
    Ok(Secret::generate()?.to_base32())
}

/// Formats the `otpauth://` URI authenticator apps scan from a QR code,
/// using SHA1, 6 digits and a 30 second period.
///
/// The issuer falls back to [`DEFAULT_ISSUER`] when none is given.
pub fn provisioning_uri(secret: &str, account_label: &str, issuer: Option<&str>) -> String {
    let mut config = TotpConfig::default();
    if let Some(issuer) = issuer {
        config.with_issuer(issuer);
    }

    otp_to_uri(&config, secret, account_label)
}

impl Totp {
    /// Formats the provisioning URI with this engine's issuer, algorithm,
    /// digits and period.
    pub fn provisioning_uri(&self, secret: &str, account_label: &str) -> String {
        otp_to_uri(self.config(), secret, account_label)
    }
}

fn otp_to_uri(config: &TotpConfig, secret: &str, account_label: &str) -> String {
    let issuer = utf8_percent_encode(config.issuer(), COMPONENT);
    let label = utf8_percent_encode(account_label, COMPONENT);
    let secret = utf8_percent_encode(secret, COMPONENT);

    format!(
        "{SCHEME}://{TOTP_TYPE}/{issuer}:{label}?{URI_SECRET_QUERY}={secret}\
         &{URI_ISSUER_QUERY}={issuer}&{URI_HASH_QUERY}={}&{URI_DIGITS_QUERY}={}\
         &{URI_PERIOD_QUERY}={}",
        config.algorithm(),
        config.digits(),
        config.period(),
    )
}

/// Contents of a parsed `otpauth://totp/` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningUri {
    pub secret: String,
    pub account_label: String,
    pub issuer: Option<String>,
    pub algorithm: OtpHashAlgorithm,
    pub digits: u32,
    pub period: u64,
}

impl ProvisioningUri {
    pub fn secret(&self) -> Secret {
        Secret::from_base32(&self.secret)
    }

    /// Builds an engine matching the URI's parameters, rejecting values the
    /// engine cannot work with.
    pub fn to_totp(&self) -> Result<Totp, OtpError> {
        let mut config = TotpConfig::new(self.issuer.as_deref().unwrap_or(DEFAULT_ISSUER));
        config
            .with_algorithm(self.algorithm)
            .with_digits(self.digits)
            .with_period(self.period);

        Totp::new(config)
    }
}

/// Parses a provisioning URI back into its parts.
///
/// The `issuer` query parameter wins over the label prefix when both exist.
pub fn parse_provisioning_uri(uri: &str) -> Result<ProvisioningUri, OtpError> {
    let uri = url::Url::parse(uri).map_err(OtpError::UriParseError)?;

    if uri.scheme() != SCHEME {
        return Err(OtpError::InvalidUriType(
            uri.scheme().into(),
            SCHEME.into(),
        ));
    }

    let domain = uri.domain();
    if domain.is_none() || domain.is_some_and(|d| d != TOTP_TYPE) {
        return Err(OtpError::InvalidUriType(
            domain.unwrap_or("None").into(),
            TOTP_TYPE.into(),
        ));
    }

    let raw_path = uri.path().trim_start_matches('/');
    let path = percent_decode_str(raw_path)
        .decode_utf8()
        .map_err(|_| OtpError::UnsupportedUriParameter("label".into(), raw_path.into()))?;

    let (label_issuer, account_label) = match path.split_once(':') {
        Some((issuer, label)) => (Some(issuer.to_string()), label.trim_start().to_string()),
        None => (None, path.to_string()),
    };

    let mut secret = "".to_string();
    let mut issuer = None;
    let mut algorithm = OtpHashAlgorithm::default();
    let mut digits: u32 = 6;
    let mut period: u64 = 30;

    for (key, value) in uri.query_pairs() {
        match &*key {
            URI_SECRET_QUERY => secret = value.to_string(),
            URI_ISSUER_QUERY => issuer = Some(value.to_string()),
            URI_HASH_QUERY => algorithm = value.parse::<OtpHashAlgorithm>()?,
            URI_DIGITS_QUERY => {
                digits = value
                    .parse::<u32>()
                    .map_err(|e| OtpError::IntegerParseError(e, URI_DIGITS_QUERY.into()))?
            }
            URI_PERIOD_QUERY => {
                period = value
                    .parse::<u64>()
                    .map_err(|e| OtpError::IntegerParseError(e, URI_PERIOD_QUERY.into()))?
            }
            _ => (),
        }
    }

    if secret.is_empty() {
        return Err(OtpError::UriMissingSecret);
    }

    Ok(ProvisioningUri {
        secret,
        account_label,
        issuer: issuer.or(label_issuer),
        algorithm,
        digits,
        period,
    })
}
