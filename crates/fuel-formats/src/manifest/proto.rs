//! Protobuf wire messages of the download manifest (proto2)
//!
//! These mirror the distribution service schema field for field. Enum
//! fields stay raw `i32` so unknown values survive decoding and can be
//! rejected explicitly by the typed model.

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum CompressionAlgorithm {
    None = 0,
    Lzma = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum HashAlgorithm {
    Sha256 = 0,
    Shake128 = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum SignatureAlgorithm {
    Sha256WithRsa = 0,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CompressionSettings {
    #[prost(enumeration = "CompressionAlgorithm", required, tag = "1")]
    pub algorithm: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Dir {
    #[prost(string, optional, tag = "1")]
    pub path: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(uint32, optional, tag = "2")]
    pub mode: ::core::option::Option<u32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct File {
    #[prost(string, optional, tag = "1")]
    pub path: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(uint32, optional, tag = "2")]
    pub mode: ::core::option::Option<u32>,
    #[prost(int64, optional, tag = "3")]
    pub size: ::core::option::Option<i64>,
    #[prost(string, optional, tag = "4")]
    pub created: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(message, optional, tag = "5")]
    pub hash: ::core::option::Option<Hash>,
    #[prost(bool, optional, tag = "6")]
    pub hidden: ::core::option::Option<bool>,
    #[prost(bool, optional, tag = "7")]
    pub system: ::core::option::Option<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Hash {
    #[prost(enumeration = "HashAlgorithm", optional, tag = "1")]
    pub algorithm: ::core::option::Option<i32>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub value: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Manifest {
    #[prost(message, repeated, tag = "1")]
    pub packages: ::prost::alloc::vec::Vec<Package>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ManifestHeader {
    #[prost(message, optional, tag = "1")]
    pub compression: ::core::option::Option<CompressionSettings>,
    #[prost(message, optional, tag = "2")]
    pub hash: ::core::option::Option<Hash>,
    #[prost(message, optional, tag = "3")]
    pub signature: ::core::option::Option<Signature>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Package {
    #[prost(string, optional, tag = "1")]
    pub name: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(message, repeated, tag = "2")]
    pub files: ::prost::alloc::vec::Vec<File>,
    #[prost(message, repeated, tag = "3")]
    pub dirs: ::prost::alloc::vec::Vec<Dir>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Signature {
    #[prost(enumeration = "SignatureAlgorithm", optional, tag = "1")]
    pub algorithm: ::core::option::Option<i32>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub value: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}
