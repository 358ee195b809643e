// Keyword vocabulary (English + Portuguese) used to normalize free text into slot enums.
//
// All scanners take lowercased text. Matches must sit on word boundaries, and
// when several entries of one table match, the one mentioned last wins so that
// corrections like "blue... actually green" resolve to the correction.

use super::types::{Environment, Finish, Surface};

pub const ENVIRONMENT_TERMS: &[(Environment, &[&str])] = &[
    (
        Environment::Exterior,
        &[
            "exterior", "outdoor", "outdoors", "outside", "external", "façade", "facade",
            "outer wall", "garden wall", "balcony", "porch", "externo", "externa", "fachada",
            "muro", "varanda", "área externa", "area externa",
        ],
    ),
    (
        Environment::Interior,
        &[
            "interior", "indoor", "indoors", "inside", "internal", "interno", "interna",
            "dentro de casa",
        ],
    ),
];

pub const SURFACE_TERMS: &[(Surface, &[&str])] = &[
    (
        Surface::Wall,
        &[
            "wall", "walls", "façade", "facade", "outer wall", "drywall", "plaster", "ceiling",
            "parede", "paredes", "fachada", "muro", "teto", "gesso",
        ],
    ),
    (
        Surface::Wood,
        &[
            "wood", "wooden", "timber", "deck", "furniture", "madeira", "deck de madeira",
            "móveis", "moveis",
        ],
    ),
    (
        Surface::Metal,
        &[
            "metal", "metallic", "iron", "steel", "railing", "gate", "metálica", "metalica",
            "ferro", "aço", "portão", "portao", "grade",
        ],
    ),
    (
        Surface::Tile,
        &[
            "tile", "tiles", "tiled", "ceramic", "azulejo", "azulejos", "cerâmica", "ceramica",
        ],
    ),
];

/// Ordered most-specific first: "semi-gloss" must be masked before "gloss" is scanned.
pub const FINISH_TERMS: &[(Finish, &[&str])] = &[
    (
        Finish::SemiGloss,
        &[
            "semi-gloss", "semi gloss", "semigloss", "semi-brilhante", "semi brilhante",
            "semibrilho",
        ],
    ),
    (
        Finish::Gloss,
        &["gloss", "glossy", "high gloss", "shiny", "brilhante", "brilho"],
    ),
    (Finish::Satin, &["satin", "eggshell", "acetinado", "acetinada"]),
    (Finish::Matte, &["matte", "matt", "flat", "fosco", "fosca"]),
];

pub const COLOR_TERMS: &[(&str, &[&str])] = &[
    ("blue", &["blue", "navy", "azul"]),
    ("red", &["red", "vermelho", "vermelha"]),
    ("green", &["green", "verde"]),
    ("yellow", &["yellow", "amarelo", "amarela"]),
    ("white", &["white", "off-white", "branco", "branca"]),
    ("gray", &["gray", "grey", "cinza"]),
    ("pink", &["pink", "rosa"]),
    ("purple", &["purple", "violet", "lilac", "roxo", "roxa", "violeta", "lilás", "lilas"]),
    ("orange", &["orange", "laranja"]),
    ("brown", &["brown", "marrom"]),
    ("beige", &["beige", "bege", "nude"]),
    ("black", &["black", "preto", "preta"]),
];

pub const ROOM_TERMS: &[(&str, &[&str])] = &[
    ("bedroom", &["bedroom", "bedrooms", "nursery", "quarto", "dormitório", "dormitorio"]),
    ("living room", &["living room", "lounge", "sala", "sala de estar"]),
    ("office", &["office", "home office", "study", "escritório", "escritorio"]),
    ("bathroom", &["bathroom", "restroom", "banheiro", "lavabo"]),
    ("kitchen", &["kitchen", "cozinha"]),
    ("facade", &["façade", "facade", "fachada"]),
    ("balcony", &["balcony", "porch", "varanda"]),
];

pub const AUDIENCE_TERMS: &[(&str, &[&str])] = &[
    (
        "child",
        &[
            "child", "children", "kid", "kids", "son", "daughter", "baby", "toddler", "nursery",
            "filho", "filha", "criança", "crianca", "crianças", "infantil", "bebê", "bebe",
        ],
    ),
    ("pets", &["pet", "pets", "dog", "dogs", "cat", "cats", "cachorro", "gato"]),
    ("elderly", &["elderly", "grandmother", "grandfather", "idoso", "idosa", "avó", "avô"]),
];

/// Words that open a reactive turn ("ok", "and matte?", "actually green")
pub const CONTINUATION_MARKERS: &[&str] = &[
    "and", "ok", "okay", "yes", "yeah", "sure", "actually", "also", "what about", "e", "sim",
    "também", "tambem", "na verdade", "mas", "e se",
];

pub const GREETING_TERMS: &[&str] = &[
    "hi", "hello", "hey", "good morning", "good afternoon", "good evening", "oi", "olá", "ola",
    "bom dia", "boa tarde", "boa noite",
];

pub const VISUALIZATION_TERMS: &[&str] = &[
    "show me", "image", "picture", "preview", "visualize", "how would it look",
    "what would it look like", "mostra", "mostrar", "me mostra", "imagem", "visualizar",
    "como ficaria", "quero ver",
];

/// Paint manufacturers; a reply may only name the grounded product's own
pub const BRAND_TERMS: &[&str] = &[
    "suvinil", "coral", "sherwin", "sherwin-williams", "lukscolor", "eucatex", "metalatex",
    "renner", "iquine", "hydronorth", "anjo",
];

// ============================================================================
// Matching helpers
// ============================================================================

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

/// Byte offsets of every boundary-respecting occurrence of `term` in `text`
fn term_positions(text: &str, term: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    if term.is_empty() {
        return positions;
    }
    let mut from = 0;
    while let Some(rel) = text[from..].find(term) {
        let start = from + rel;
        let end = start + term.len();
        let before_ok = text[..start].chars().next_back().map_or(true, |c| !is_word_char(c));
        let after_ok = text[end..].chars().next().map_or(true, |c| !is_word_char(c));
        if before_ok && after_ok {
            positions.push(start);
        }
        from = start + text[start..].chars().next().map_or(1, |c| c.len_utf8());
    }
    positions
}

/// Whether `term` occurs in `text` on word boundaries
pub fn contains_term(text: &str, term: &str) -> bool {
    !term_positions(text, term).is_empty()
}

pub fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| contains_term(text, term))
}

/// Every mention of a table entry as `(byte offset, value)`, sorted by offset.
///
/// Entries are processed in table order and every match is masked out before
/// the next entry is scanned, so earlier (more specific) entries shadow later
/// ones on the same span.
pub fn scan_all<T: Copy>(text: &str, table: &[(T, &[&str])]) -> Vec<(usize, T)> {
    let mut masked = text.to_string();
    let mut found: Vec<(usize, T)> = Vec::new();

    for (value, terms) in table {
        // Longer terms first so "outer wall" masks before "wall"
        let mut ordered: Vec<&str> = terms.to_vec();
        ordered.sort_by_key(|t| std::cmp::Reverse(t.len()));

        for term in ordered {
            for pos in term_positions(&masked, term) {
                found.push((pos, *value));
                masked.replace_range(pos..pos + term.len(), &" ".repeat(term.len()));
            }
        }
    }

    found.sort_by_key(|(pos, _)| *pos);
    found
}

/// The table entry mentioned last, if any
pub fn scan_last<T: Copy>(text: &str, table: &[(T, &[&str])]) -> Option<T> {
    scan_all(text, table).last().map(|(_, value)| *value)
}

pub fn detect_environment(text: &str) -> Option<Environment> {
    scan_last(text, ENVIRONMENT_TERMS)
}

pub fn detect_surface(text: &str) -> Option<Surface> {
    scan_last(text, SURFACE_TERMS)
}

pub fn detect_finish(text: &str) -> Option<Finish> {
    scan_last(text, FINISH_TERMS)
}

pub fn detect_color(text: &str) -> Option<String> {
    scan_last(text, COLOR_TERMS).map(str::to_string)
}

pub fn detect_room_type(text: &str) -> Option<String> {
    scan_last(text, ROOM_TERMS).map(str::to_string)
}

pub fn detect_audience(text: &str) -> Option<String> {
    scan_last(text, AUDIENCE_TERMS).map(str::to_string)
}

/// Canonical English name for a color label, or the trimmed lowercase label itself
pub fn canonical_color(label: &str) -> String {
    let lowered = label.trim().to_lowercase();
    detect_color(&lowered).unwrap_or(lowered)
}

/// Short reactive turns modify the current slot set instead of opening a new request
pub fn is_follow_up(utterance: &str, max_chars: usize) -> bool {
    let text = utterance.trim().to_lowercase();
    if text.chars().count() < max_chars {
        return true;
    }
    CONTINUATION_MARKERS.iter().any(|marker| {
        text.starts_with(marker)
            && text[marker.len()..]
                .chars()
                .next()
                .map_or(true, |c| !is_word_char(c))
    })
}

pub fn is_greeting(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    GREETING_TERMS.iter().any(|greeting| {
        text.starts_with(greeting)
            && text[greeting.len()..]
                .chars()
                .next()
                .map_or(true, |c| !is_word_char(c))
    })
}

pub fn wants_visualization(text: &str) -> bool {
    contains_any(&text.to_lowercase(), VISUALIZATION_TERMS)
}
