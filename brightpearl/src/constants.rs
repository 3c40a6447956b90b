use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

/// API version sent as the `apiVersion` URI parameter.
pub const API_VERSION: &str = "2.0.0";

/// Datacenter used when `api_domain` is not configured.
pub const DEFAULT_API_DOMAIN: &str = "ws-eu1.brightpearl.com";

/// Name of the root resource listing the sub-service resources.
pub const ROOT_RESOURCE: &str = "service-config";

// Setting keys
pub const API_DOMAIN: &str = "api_domain";
pub const ACCOUNT_CODE: &str = "account_code";
pub const ACCOUNT_TOKEN: &str = "account_token";
pub const APP_REFERENCE: &str = "app_reference";
pub const DEV_REFERENCE: &str = "dev_reference";
pub const DEV_SECRET: &str = "dev_secret";
pub const DEV_TOKEN: &str = "dev_token";
pub const STAFF_TOKEN: &str = "staff_token";
pub const API_VERSION_PARAM: &str = "apiVersion";

// Header wire names
pub const HEADER_DEV_REF: &str = "brightpearl-dev-ref";
pub const HEADER_APP_REF: &str = "brightpearl-app-ref";
pub const HEADER_ACCOUNT_TOKEN: &str = "brightpearl-account-token";
pub const HEADER_STAFF_TOKEN: &str = "brightpearl-staff-token";

// Env values
pub const BRIGHTPEARL_DEV_REFERENCE: &str = "BRIGHTPEARL_DEV_REFERENCE";
pub const BRIGHTPEARL_DEV_SECRET: &str = "BRIGHTPEARL_DEV_SECRET";
pub const BRIGHTPEARL_APP_REFERENCE: &str = "BRIGHTPEARL_APP_REFERENCE";
pub const BRIGHTPEARL_ACCOUNT_CODE: &str = "BRIGHTPEARL_ACCOUNT_CODE";
pub const BRIGHTPEARL_ACCOUNT_TOKEN: &str = "BRIGHTPEARL_ACCOUNT_TOKEN";
pub const BRIGHTPEARL_API_DOMAIN: &str = "BRIGHTPEARL_API_DOMAIN";
pub const BRIGHTPEARL_STAFF_TOKEN: &str = "BRIGHTPEARL_STAFF_TOKEN";

// Callback query fields
pub const CALLBACK_ACCOUNT_CODE: &str = "accountCode";
pub const CALLBACK_TIMESTAMP: &str = "timestamp";
pub const CALLBACK_TOKEN: &str = "token";
pub const CALLBACK_SIGNATURE: &str = "signature";

/// AsciiSet for `{name}` expansion in URI templates.
///
/// - Encode every byte except the unreserved characters: 'A'-'Z', 'a'-'z', '0'-'9', '-', '.', '_', and '~'.
pub static URI_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// AsciiSet for `{+name}` expansion: reserved characters and `%` pass through.
pub static URI_RESERVED_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b'%');
