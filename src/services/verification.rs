use rand::Rng;

const PREFIX: &str = "CERT";
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SUFFIX_LEN: usize = 6;

/// `CERT` plus six random alphanumerics; uniqueness is enforced at insert
/// time, callers retry on collision.
pub(crate) fn generate_verification_code() -> String {
    let mut rng = rand::thread_rng();
    let mut code = String::with_capacity(PREFIX.len() + SUFFIX_LEN);
    code.push_str(PREFIX);
    for _ in 0..SUFFIX_LEN {
        let index = rng.gen_range(0..ALPHABET.len());
        code.push(ALPHABET[index] as char);
    }
    code
}
