//! Cryptographic primitives for fuel game distribution
//!
//! This crate provides the hashing and signature checks every other part of
//! the pipeline relies on before trusting downloaded bytes.
//!
//! # Components
//!
//! - **Hashing**: SHA-256 and SHAKE128 content hashes for files and patch bodies
//! - **Signatures**: RSA PKCS#1 v1.5 / SHA-256 verification of download manifests
//!
//! # Examples
//!
//! ## Content hashing
//!
//! ```
//! use fuel_crypto::{ContentHash, HashAlgorithm};
//!
//! let hash = ContentHash::compute(HashAlgorithm::Sha256, b"Hello");
//! assert!(hash.matches(b"Hello"));
//! println!("sha256: {hash}");
//! ```
//!
//! ## Manifest signatures
//!
//! ```
//! use fuel_crypto::{SignatureAlgorithm, SignatureVerifier};
//!
//! let verifier = SignatureVerifier::embedded().expect("embedded key is valid");
//! let result = verifier.verify(SignatureAlgorithm::Sha256WithRsa, b"body", &[0u8; 256]);
//! assert!(result.is_err());
//! ```

pub mod error;
pub mod hash;
pub mod signature;

pub use error::{CryptoError, CryptoResult};
pub use hash::{Checksum, ContentHash, DEFAULT_SHAKE128_LEN, HashAlgorithm};
pub use signature::{EMBEDDED_PUBLIC_KEY, SignatureAlgorithm, SignatureVerifier};
