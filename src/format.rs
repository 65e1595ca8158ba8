//! Deterministic formatting of on-chain identifiers in agent output.
//!
//! Two sequential passes keep the precedence rule explicit: transaction
//! hashes (64 hex chars) are linked first, then addresses (40 hex chars) are
//! shortened. The first pass consumes its spans, so an address pattern can
//! never re-match text already rendered as a transaction link: the visible
//! label splits the hex run, and the hex run inside the href is 64 chars
//! long with no interior word boundary.
//!
//! Everything that matches neither pattern is preserved byte-for-byte,
//! including whitespace and line breaks. Hex runs of the wrong length match
//! neither pattern.

use std::sync::OnceLock;

use regex::Regex;

/// Visible label widths for shortened identifiers.
const TX_LABEL_HEAD: usize = 10;
const TX_LABEL_TAIL: usize = 8;
const ADDR_LABEL_HEAD: usize = 8;
const ADDR_LABEL_TAIL: usize = 6;

fn tx_hash_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b0x[a-fA-F0-9]{64}\b").expect("valid tx hash pattern"))
}

fn address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b0x[a-fA-F0-9]{40}\b").expect("valid address pattern"))
}

/// Rewrite `text` so transaction hashes become shortened markdown links to
/// the block explorer and addresses become shortened inline-code literals.
///
/// Pure and side-effect free; `format_onchain_refs(x) == x` whenever `x`
/// contains no `0x`-prefixed hex run of length 40 or 64.
pub fn format_onchain_refs(text: &str, explorer_tx_base: &str) -> String {
    let linked = tx_hash_re().replace_all(text, |caps: &regex::Captures<'_>| {
        let hash = &caps[0];
        format!(
            "[{}...{}]({}{})",
            &hash[..TX_LABEL_HEAD],
            &hash[hash.len() - TX_LABEL_TAIL..],
            explorer_tx_base,
            hash
        )
    });

    address_re()
        .replace_all(&linked, |caps: &regex::Captures<'_>| {
            let addr = &caps[0];
            format!(
                "`{}...{}`",
                &addr[..ADDR_LABEL_HEAD],
                &addr[addr.len() - ADDR_LABEL_TAIL..]
            )
        })
        .into_owned()
}

/// Shorten a wallet address for status lines: first 10 chars, `...`, last 8.
pub fn shorten_address(address: &str) -> String {
    if address.len() <= TX_LABEL_HEAD + TX_LABEL_TAIL {
        return address.to_string();
    }
    format!(
        "{}...{}",
        &address[..TX_LABEL_HEAD],
        &address[address.len() - TX_LABEL_TAIL..]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EXPLORER: &str = "https://sepolia.basescan.org/tx/";

    fn hex_run(ch: char, len: usize) -> String {
        format!("0x{}", ch.to_string().repeat(len))
    }

    #[test]
    fn passes_through_text_without_matches() {
        let cases = [
            "hello there",
            "line one\nline two\t tabbed",
            "0x is a prefix, 0x1234 is short hex",
            "deadbeef without the prefix",
        ];
        for text in cases {
            assert_eq!(format_onchain_refs(text, EXPLORER), text);
        }
    }

    #[test]
    fn links_transaction_hashes_with_sliced_label() {
        let hash = hex_run('a', 64);
        let text = format!("tx {hash} done");
        let formatted = format_onchain_refs(&text, EXPLORER);

        assert_eq!(
            formatted,
            format!("tx [0xaaaaaaaa...aaaaaaaa]({EXPLORER}{hash}) done")
        );
        assert!(formatted.ends_with(" done"));
    }

    #[test]
    fn shortens_addresses_as_inline_code() {
        let addr = hex_run('b', 40);
        let formatted = format_onchain_refs(&format!("send to {addr} please"), EXPLORER);
        assert_eq!(formatted, "send to `0xbbbbbb...bbbbbb` please");
    }

    #[test]
    fn hash_takes_precedence_over_address() {
        let hash = hex_run('c', 64);
        let formatted = format_onchain_refs(&hash, EXPLORER);

        // Exactly one link, and no inline-code address replacement anywhere,
        // including inside the href's 64-char hex run.
        assert_eq!(formatted.matches("](").count(), 1);
        assert!(!formatted.contains('`'));
        assert!(formatted.contains(&format!("{EXPLORER}{hash}")));
    }

    #[test]
    fn malformed_hex_lengths_match_neither_pattern() {
        for len in [39, 41, 63, 65] {
            let run = hex_run('d', len);
            assert_eq!(format_onchain_refs(&run, EXPLORER), run, "length {len}");
        }
        let non_hex = format!("0x{}", "g".repeat(40));
        assert_eq!(format_onchain_refs(&non_hex, EXPLORER), non_hex);
    }

    #[test]
    fn formats_hash_and_address_in_one_message() {
        let hash = hex_run('e', 64);
        let addr = hex_run('f', 40);
        let text = format!("sent from {addr}:\n{hash}");
        let formatted = format_onchain_refs(&text, EXPLORER);

        assert!(formatted.contains("`0xffffff...ffffff`"));
        assert!(formatted.contains(&format!("[0xeeeeeeee...eeeeeeee]({EXPLORER}{hash})")));
        assert!(formatted.contains(":\n"));
    }

    #[test]
    fn mixed_case_hex_is_matched() {
        let addr = format!("0xAbCdEf{}", "0".repeat(34));
        let formatted = format_onchain_refs(&addr, EXPLORER);
        assert_eq!(formatted, "`0xAbCdEf...000000`");
    }

    #[test]
    fn shorten_address_slices_head_and_tail() {
        let addr = hex_run('1', 40);
        assert_eq!(shorten_address(&addr), "0x11111111...11111111");
        assert_eq!(shorten_address("0xshort"), "0xshort");
    }
}
