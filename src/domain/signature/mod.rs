//! Provider signature codecs.
//!
//! Pure signing and verification, no I/O. Each provider signs differently:
//!
//! - [`DirectSigner`]: PayMaster direct API (query string + `iat` + secret, SHA-256)
//! - [`NotificationSigner`]: QIWI notifications (key-sorted values, HMAC-SHA1)
//! - [`ResultHash`]: PayMaster payment notifications (`LMI_HASH`, SHA-256)
//!
//! All comparisons go through [`constant_time_eq`].

mod direct;
mod errors;
mod notification;
mod params;
mod result_hash;

pub use direct::{DirectSigner, DEFAULT_MAX_SKEW_SECS, ISSUED_AT_FIELD, SIGN_FIELD};
pub use errors::SignatureError;
pub use notification::NotificationSigner;
pub use params::{php_urlencode, OrderedParams};
pub use result_hash::{ResultHash, HASHED_FIELDS, HASH_FIELD};

use subtle::ConstantTimeEq;

/// Constant-time byte comparison.
///
/// Length is not secret; only equal-length inputs are compared byte-wise.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
