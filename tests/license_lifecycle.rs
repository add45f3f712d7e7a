mod common;

use anyhow::Result;
use tempfile::tempdir;
use time::macros::date;

use licsign_core::{
    bundle, canonical,
    policy::{self, TemporalStatus},
    signing::{self, RsaPemSigner, Signer as _},
    InvalidReason, LicenseRecord, LicenseRequest, SchemaVersion, VerificationResult, Verifier,
};

#[test]
fn ada_scenario_issue_persist_verify() -> Result<()> {
    let dir = tempdir()?;
    let (sk_path, pk_path) = common::write_keys(dir.path(), common::key_a(), "issuer")?;
    let out = dir.path().join("license.json");

    let signer = RsaPemSigner::from_pem_file(&sk_path)?;
    let lic = bundle::issue(&signer, common::ada())?;
    bundle::persist(&lic, &out)?;

    let verifier = Verifier::from_public_key_file(&pk_path)?;
    let res = verifier.verify_file(&out)?;
    assert_eq!(res, VerificationResult::Valid(common::ada()));

    // Appending any character to the signature invalidates the bundle.
    for extra in ["A", "=", "x", "0"] {
        let mut tampered = bundle::load(&out)?;
        tampered.signature.push_str(extra);
        let res = verifier.verify(&tampered)?;
        assert_eq!(res, VerificationResult::Invalid(InvalidReason::SignatureMismatch));
    }
    Ok(())
}

#[test]
fn explicit_pipeline_matches_issue_helper() -> Result<()> {
    let sk = common::key_a();
    let msg = canonical::encode(&common::ada())?;
    let sig = signing::sign(sk, &msg)?;
    let manual = bundle::build(common::ada(), &sig);

    let signer = RsaPemSigner::from_key(sk.clone())?;
    let helper = bundle::issue(&signer, common::ada())?;
    assert_eq!(manual, helper);

    let res = licsign_core::verify::verify(&sk.to_public_key(), &manual)?;
    assert_eq!(res, VerificationResult::Valid(common::ada()));
    Ok(())
}

#[test]
fn v2_request_round_trips_with_defaulted_valid_from() -> Result<()> {
    let issued_on = date!(2026 - 10 - 16);
    let record = LicenseRequest {
        name: "Grace Hopper".into(),
        email: "grace@example.com".into(),
        organization: "Navy".into(),
        expiry: "2027-10-16".into(),
        valid_from: None,
        license_number: Some("00017".into()),
    }
    .into_record(SchemaVersion::V2, issued_on)?;
    assert_eq!(record.valid_from(), Some(issued_on));

    let signer = RsaPemSigner::from_key(common::key_a().clone())?;
    let lic = bundle::issue(&signer, record.clone())?;
    let text = lic.to_pretty_json()?;
    assert!(text.contains("\"license_number\": \"00017\""));
    assert!(text.contains("\"valid_from\": \"2026-10-16\""));

    let verifier = Verifier::new(common::key_a().to_public_key())?;
    let res = verifier.verify_json(&text)?;
    assert_eq!(res.record(), Some(&record));
    assert_eq!(res.record().map(LicenseRecord::schema_version), Some(SchemaVersion::V2));
    Ok(())
}

#[test]
fn pkcs1_private_key_signs_like_pkcs8() -> Result<()> {
    let dir = tempdir()?;
    let (p8, _) = common::write_keys(dir.path(), common::key_a(), "issuer")?;
    let p1 = common::write_pkcs1_private(dir.path(), common::key_a(), "issuer")?;

    let msg = canonical::encode(&common::ada_v2())?;
    let a = RsaPemSigner::from_pem_file(&p8)?.sign(&msg)?;
    let b = RsaPemSigner::from_pem_file(&p1)?.sign(&msg)?;
    assert_eq!(a, b);
    Ok(())
}

#[test]
fn reissuing_same_record_is_byte_identical() -> Result<()> {
    let dir = tempdir()?;
    let signer = RsaPemSigner::from_key(common::key_a().clone())?;
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");
    bundle::persist(&bundle::issue(&signer, common::ada_v2())?, &first)?;
    bundle::persist(&bundle::issue(&signer, common::ada_v2())?, &second)?;
    assert_eq!(std::fs::read(&first)?, std::fs::read(&second)?);
    Ok(())
}

#[test]
fn verifier_shared_across_threads() -> Result<()> {
    let signer = RsaPemSigner::from_key(common::key_a().clone())?;
    let lic = bundle::issue(&signer, common::ada())?;
    let verifier = Verifier::new(common::key_a().to_public_key())?;

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| verifier.verify(&lic).map(|r| r.is_valid())))
            .collect();
        for h in handles {
            assert!(h.join().unwrap().unwrap());
        }
    });
    Ok(())
}

#[test]
fn calendar_expired_license_still_verifies() -> Result<()> {
    let record = LicenseRecord::new("Ada", "ada@example.com", "Acme", date!(2001 - 01 - 01))?;
    let signer = RsaPemSigner::from_key(common::key_a().clone())?;
    let lic = bundle::issue(&signer, record.clone())?;

    let verifier = Verifier::new(common::key_a().to_public_key())?;
    let res = verifier.verify_json(&lic.to_pretty_json()?)?;
    assert_eq!(res, VerificationResult::Valid(record.clone()));

    // Expiry is a policy concern layered on top of a valid signature.
    assert_eq!(
        policy::evaluate(&record, date!(2026 - 10 - 16)),
        TemporalStatus::Expired { expiry: date!(2001 - 01 - 01) }
    );
    Ok(())
}
