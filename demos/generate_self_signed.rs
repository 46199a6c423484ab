use cert_mint::request::CertRequest;
use std::fs;

/// Generate a self-signed ECDSA certificate for localhost and write both
/// PEM artifacts into the folder certs. The library itself never touches
/// the filesystem; the caller writes the encoded bytes.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Generating certificate and key...");
    let cert = CertRequest::new()
        .hostname("localhost")
        .curve("P256")
        .valid_for_days(90)
        .generate()?;

    let (cert_pem, key_pem) = cert.to_pem()?;

    fs::create_dir_all("./certs")?;
    fs::write("./certs/localhost_cert.pem", cert_pem)?;
    fs::write("./certs/localhost_pkey.pem", key_pem)?;
    println!("Wrote ./certs/localhost_cert.pem and ./certs/localhost_pkey.pem");
    Ok(())
}
