// Licensed under the Apache-2.0 license

#![no_main]

use amdcert::{AmdCert, ChainValidator, AMD_CERT_MAX_SIZE};
use crypto::OpensslCrypto;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let crypto = OpensslCrypto::new();
    let validator = ChainValidator::new(&crypto);

    let Ok(cert) = AmdCert::parse(data) else {
        return;
    };
    assert!(cert.size() <= data.len());

    let mut out = [0u8; AMD_CERT_MAX_SIZE];
    let len = cert.serialize(&mut out).unwrap();
    assert_eq!(&out[..len], &data[..len]);

    let _ = validator.validate_root(&cert);
    let _ = validator.validate_subordinate(&cert, &cert);
    let _ = cert.export_pub_key();

    if let Ok((ask, ark)) = AmdCert::parse_chain(data) {
        let _ = validator.validate_chain(&ask, &ark);
    }
});
