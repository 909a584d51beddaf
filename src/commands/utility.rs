//! Offline commands: key table, challenge responses and config.

use anyhow::{bail, Context as _};
use speededitor::{compute_response, LedGroup, KEYS};

use super::{CommandResult, Context};

/// Print the key table
pub fn keys() -> CommandResult {
    println!(
        "{:>3}  {:>6}  {:<12}  {:<20}  LED",
        "#", "code", "name", "label"
    );
    for key in KEYS.iter() {
        let led = match key.led {
            Some(slot) => {
                let group = match slot.group {
                    LedGroup::RegularKeys => "keys",
                    LedGroup::WheelKeys => "wheel",
                };
                format!("{group}:{}", slot.bit)
            }
            None => "-".to_string(),
        };
        println!(
            "{:>3}  0x{:04x}  {:<12}  {:<20}  {}",
            key.logical_code, key.key_code, key.name, key.label, led
        );
    }
    Ok(())
}

/// Compute the response to a challenge given on the command line
pub fn response(challenge: &str) -> CommandResult {
    let challenge = parse_challenge(challenge)?;
    let response = compute_response(challenge);
    println!("Challenge: {}", to_hex(&challenge));
    println!("Response:  {}", to_hex(&response));
    Ok(())
}

/// Print (and optionally save) the effective config
pub fn config(ctx: &Context, save: bool) -> CommandResult {
    println!("# {}", ctx.config_path.display());
    print!("{}", ctx.config.to_toml()?);
    if save {
        ctx.config
            .save(&ctx.config_path)
            .with_context(|| format!("Failed to write {}", ctx.config_path.display()))?;
        eprintln!("Saved to {}", ctx.config_path.display());
    }
    Ok(())
}

/// Parse 8 bytes of hex in wire order; `0x`, spaces and colons are ignored
fn parse_challenge(input: &str) -> anyhow::Result<[u8; 8]> {
    let digits: String = input
        .trim()
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !matches!(c, ' ' | ':'))
        .collect();
    if digits.len() != 16 {
        bail!("Challenge must be 8 bytes (16 hex digits), got {} digits", digits.len());
    }

    let mut challenge = [0u8; 8];
    for (i, byte) in challenge.iter_mut().enumerate() {
        let pair = digits.get(i * 2..i * 2 + 2).context("Invalid hex")?;
        *byte = u8::from_str_radix(pair, 16).with_context(|| format!("Invalid hex byte '{pair}'"))?;
    }
    Ok(challenge)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_challenge() {
        assert_eq!(
            parse_challenge("efcdab8967452301").unwrap(),
            [0xef, 0xcd, 0xab, 0x89, 0x67, 0x45, 0x23, 0x01]
        );
        assert_eq!(
            parse_challenge("0xef:cd:ab:89 67 45 23 01").unwrap(),
            [0xef, 0xcd, 0xab, 0x89, 0x67, 0x45, 0x23, 0x01]
        );
    }

    #[test]
    fn test_parse_challenge_rejects_bad_input() {
        assert!(parse_challenge("efcd").is_err());
        assert!(parse_challenge("zzcdab8967452301").is_err());
        assert!(parse_challenge("efcdab89674523011").is_err());
        // Multi-byte characters must not panic
        assert!(parse_challenge("ééééééééééééééé").is_err());
    }

    #[test]
    fn test_response_hex() {
        let challenge = parse_challenge("efcdab8967452301").unwrap();
        assert_eq!(to_hex(&compute_response(challenge)), "087696e989b6c7e5");
    }
}
