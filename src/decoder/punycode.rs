//! Punycode variant used for non-ASCII identifiers.
//!
//! Differs from RFC 3492 in two places: `_` is the delimiter instead of `-`, and the
//! digit values 26..=35 are written `A`..=`J` instead of `0`..=`9`. Decoded code points
//! in `0xD800..0xD880` stand for ASCII bytes that were encoded alongside non-ASCII text.

const BASE: u32 = 36;
const TMIN: u32 = 1;
const TMAX: u32 = 26;
const SKEW: u32 = 38;
const DAMP: u32 = 700;
const INITIAL_BIAS: u32 = 72;
const INITIAL_N: u32 = 128;
const DELIMITER: char = '_';

fn digit_value(c: char) -> Option<u32> {
    match c {
        'a'..='z' => Some(c as u32 - 'a' as u32),
        'A'..='J' => Some(c as u32 - 'A' as u32 + 26),
        _ => None,
    }
}

fn adapt(mut delta: u32, num_points: u32, first_time: bool) -> u32 {
    delta = if first_time { delta / DAMP } else { delta / 2 };
    delta += delta / num_points;
    let mut k = 0;
    while delta > ((BASE - TMIN) * TMAX) / 2 {
        delta /= BASE - TMIN;
        k += BASE;
    }
    k + ((BASE - TMIN + 1) * delta) / (delta + SKEW)
}

fn decode_code_points(input: &str) -> Option<Vec<u32>> {
    let mut output: Vec<u32> = Vec::new();
    let encoded = match input.rfind(DELIMITER) {
        Some(pos) => {
            for c in input[..pos].chars() {
                if !c.is_ascii() {
                    return None;
                }
                output.push(c as u32);
            }
            &input[pos + 1..]
        }
        None => input,
    };

    let mut n = INITIAL_N;
    let mut i: u32 = 0;
    let mut bias = INITIAL_BIAS;
    let mut chars = encoded.chars().peekable();

    while chars.peek().is_some() {
        let old_i = i;
        let mut w: u32 = 1;
        let mut k = BASE;
        loop {
            let digit = digit_value(chars.next()?)?;
            i = digit.checked_mul(w).and_then(|d| i.checked_add(d))?;
            let t = if k <= bias {
                TMIN
            } else if k >= bias + TMAX {
                TMAX
            } else {
                k - bias
            };
            if digit < t {
                break;
            }
            w = w.checked_mul(BASE - t)?;
            k += BASE;
        }
        let len = output.len() as u32 + 1;
        bias = adapt(i - old_i, len, old_i == 0);
        n = n.checked_add(i / len)?;
        i %= len;
        if n < 0x80 {
            return None;
        }
        output.insert(i as usize, n);
        i += 1;
    }
    Some(output)
}

/// Decode a Punycode-encoded identifier. `None` on any malformed input.
pub fn decode_punycode(input: &str) -> Option<String> {
    decode_code_points(input)?
        .into_iter()
        .map(|cp| {
            let cp = if (0xD800..0xD880).contains(&cp) {
                cp - 0xD800
            } else {
                cp
            };
            char::from_u32(cp)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_latin() {
        assert_eq!(decode_punycode("Bcher_kva").as_deref(), Some("Bücher"));
        assert_eq!(
            decode_punycode("PorqunopuedensimplementehablarenEspaol_fmdFGa").as_deref(),
            Some("PorquénopuedensimplementehablarenEspañol")
        );
    }

    #[test]
    fn test_decode_uses_letter_digits_for_high_values() {
        assert_eq!(
            decode_punycode("3B_wwEcFeBIAeFHFaGFlsyCb").as_deref(),
            Some("3年B組金八先生")
        );
    }

    #[test]
    fn test_delimiter_is_last_underscore() {
        // Everything before the final underscore is literal.
        assert_eq!(decode_punycode("a_b_").as_deref(), Some("a_b"));
    }

    #[test]
    fn test_rejects_invalid_digits() {
        assert_eq!(decode_punycode("abc_9"), None);
        assert_eq!(decode_punycode("abc_K"), None);
    }

    #[test]
    fn test_rejects_overflow() {
        assert_eq!(decode_punycode("zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz"), None);
    }
}
