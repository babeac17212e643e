use std::str::FromStr;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::{
    config::{DEFAULT_ALGORITHM, DEFAULT_DIGITS, DEFAULT_PERIOD, URI_SCHEME},
    key::{Key, OtpType},
    Digits, OtpError, OtpHashAlgorithm,
};

pub(crate) const TOTP_TYPE: &str = "totp";
pub(crate) const HOTP_TYPE: &str = "hotp";

const URI_SECRET_QUERY: &str = "secret";
const URI_ISSUER_QUERY: &str = "issuer";
const URI_HASH_QUERY: &str = "algorithm";
const URI_PERIOD_QUERY: &str = "period";
const URI_DIGITS_QUERY: &str = "digits";

// Label components are literal text, so `%` must be escaped too
const LABEL_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Everything that goes into a TOTP provisioning URI
pub(crate) struct TotpUriInput<'a> {
    pub issuer: &'a str,
    pub account_name: &'a str,
    pub secret: &'a str,
    pub period: u64,
    pub algorithm: OtpHashAlgorithm,
    pub digits: Digits,
}

/// Builds `otpauth://totp/<issuer>:<account>?secret=..&issuer=..&period=..&algorithm=..&digits=..`
pub(crate) fn totp_to_uri(input: &TotpUriInput) -> Result<String, OtpError> {
    let mut uri = url::Url::parse(&format!("{URI_SCHEME}://{TOTP_TYPE}/"))
        .map_err(OtpError::UriParseError)?;

    uri.set_path(&format!(
        "/{}:{}",
        utf8_percent_encode(input.issuer, LABEL_ENCODE_SET),
        utf8_percent_encode(input.account_name, LABEL_ENCODE_SET)
    ));

    uri.query_pairs_mut()
        .append_pair(URI_SECRET_QUERY, input.secret)
        .append_pair(URI_ISSUER_QUERY, input.issuer)
        .append_pair(URI_PERIOD_QUERY, &input.period.to_string())
        .append_pair(URI_HASH_QUERY, &input.algorithm.to_string())
        .append_pair(URI_DIGITS_QUERY, &input.digits.to_string());

    Ok(uri.to_string())
}

pub(crate) fn key_from_uri(original: &str) -> Result<Key, OtpError> {
    let original = original.trim();
    let uri = url::Url::parse(original).map_err(OtpError::UriParseError)?;

    if uri.scheme() != URI_SCHEME {
        return Err(OtpError::InvalidUriScheme(uri.scheme().into()));
    }

    let otp_type = match uri.host_str() {
        Some(TOTP_TYPE) => OtpType::Totp,
        Some(HOTP_TYPE) => OtpType::Hotp,
        other => {
            return Err(OtpError::InvalidUriType(
                other.unwrap_or("None").into(),
                format!("{TOTP_TYPE} or {HOTP_TYPE}"),
            ))
        }
    };

    let label = percent_decode_str(uri.path().trim_start_matches('/'))
        .decode_utf8()
        .map_err(OtpError::UriLabelEncoding)?;

    let (label_issuer, account_name) = match label.split_once(':') {
        Some((issuer, account)) => (
            Some(issuer.trim().to_string()),
            account.trim().to_string(),
        ),
        None => (None, label.trim().to_string()),
    };

    let mut secret = "".to_string();
    let mut issuer = None;
    let mut algorithm = DEFAULT_ALGORITHM;
    let mut period = DEFAULT_PERIOD;
    let mut digits = DEFAULT_DIGITS;

    for params in uri.query_pairs() {
        match &*params.0 {
            URI_SECRET_QUERY => secret = params.1.to_string(),
            URI_ISSUER_QUERY => issuer = Some(params.1.to_string()),
            URI_HASH_QUERY => {
                algorithm = OtpHashAlgorithm::from_str(params.1.as_ref())?
            }
            URI_PERIOD_QUERY => {
                period = u64::from_str(params.1.as_ref())
                    .map_err(|e| OtpError::IntegerParseError(e, URI_PERIOD_QUERY.into()))?
            }
            URI_DIGITS_QUERY => digits = Digits::from_str(params.1.as_ref())?,
            _ => (),
        }
    }

    if secret.is_empty() {
        return Err(OtpError::UriMissingSecret);
    }

    if period == 0 {
        return Err(OtpError::InvalidPeriod);
    }

    Ok(Key {
        url: original.to_string(),
        otp_type,
        issuer: issuer.filter(|i| !i.is_empty()).or(label_issuer),
        account_name,
        secret,
        period,
        digits,
        algorithm,
    })
}
