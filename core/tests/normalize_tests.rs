use catalog_core::normalize::normalize_search_string;

const SAMPLES: &[&str] = &[
    "",
    "   ",
    "  oem-99 AB ",
    "ABC-123",
    "Café  Crème",
    "Ｆｕｌｌ－ｗｉｄｔｈ ＡＢＣ１２３",
    "АВ-12 колодки",
    "x--y..z//",
    "İstanbul ǅemal ㎁ ﬁlter",
    "½ inch, 3/8\" drive; 12.5mm",
    "\u{0041}\u{030A}ngström",
];

#[test]
fn normalization_is_idempotent() {
    for sample in SAMPLES {
        let once = normalize_search_string(sample);
        assert_eq!(normalize_search_string(&once), once, "sample {sample:?}");
    }
}

#[test]
fn codes_fold_to_one_case() {
    assert_eq!(normalize_search_string("AbC-123"), normalize_search_string("abc-123"));
    assert_eq!(normalize_search_string("ABC-123"), "abc-123");
}

#[test]
fn strips_diacritics() {
    assert_eq!(normalize_search_string("Café Crème"), "cafe creme");
}

#[test]
fn full_width_codes_become_ascii() {
    assert_eq!(normalize_search_string("ＡＢＣ１２３"), "abc123");
}

#[test]
fn cyrillic_lookalikes_in_codes_are_transliterated() {
    // Cyrillic А and В next to digits, a genuinely Cyrillic word left alone
    assert_eq!(normalize_search_string("АВ-12 колодки"), "ab-12 колодки");
}

#[test]
fn punctuation_separates_tokens() {
    assert_eq!(normalize_search_string("brake,pad;  (front)"), "brake pad front");
    assert_eq!(normalize_search_string("x--y"), "x y");
    assert_eq!(normalize_search_string("-abc-"), "abc");
}
