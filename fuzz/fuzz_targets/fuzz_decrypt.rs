#![no_main]

use libfuzzer_sys::fuzz_target;
use lookout::domain::repositories::{CipherError, PasswordCipher};
use lookout::infrastructure::cipher::{AesGcmCipher, CipherOptions};

fuzz_target!(|input: (&str, &str)| {
    let Ok(cipher) = AesGcmCipher::new(CipherOptions::lightweight()) else {
        return;
    };
    let (ciphertext, secret) = input;
    match cipher.decrypt(ciphertext, secret) {
        Ok(_) | Err(CipherError::Authentication) => {}
        Err(e) => panic!("unexpected decrypt error: {e}"),
    }
});
