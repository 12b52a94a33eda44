//! Manufacturer codes used by the target dataset, mapped to the names the
//! price source uses. Display only: matching never consults this table.

const MAKES: &[(&str, &str)] = &[
    ("ACUR", "Acura"),
    ("AUDI", "Audi"),
    ("BENT", "Bentley"),
    ("BMW", "BMW"),
    ("BUIC", "Buick"),
    ("CADI", "Cadillac"),
    ("CHEV", "Chevrolet"),
    ("CHRY", "Chrysler"),
    ("DODG", "Dodge"),
    ("FERR", "Ferrari"),
    ("FIAT", "FIAT"),
    ("FORD", "Ford"),
    ("GEO", "Geo"),
    ("GMC", "GMC"),
    ("HOND", "Honda"),
    ("HUMM", "HUMMER"),
    ("HYUN", "Hyundai"),
    ("INFI", "INFINITI"),
    ("ISUZ", "Isuzu"),
    ("JAG", "Jaguar"),
    ("JEEP", "Jeep"),
    ("KIA", "Kia"),
    ("LEXU", "Lexus"),
    ("LINC", "Lincoln"),
    ("MAZD", "Mazda"),
    ("MERC", "Mercury"),
    ("MERZ", "Mercedes-Benz"),
    ("MINI", "MINI"),
    ("MITS", "Mitsubishi"),
    ("NISS", "Nissan"),
    ("OLDS", "Oldsmobile"),
    ("PLYM", "Plymouth"),
    ("PONT", "Pontiac"),
    ("PORS", "Porsche"),
    ("RAM", "RAM"),
    ("SAAB", "Saab"),
    ("SATU", "Saturn"),
    ("SCIO", "Scion"),
    ("SUBA", "Subaru"),
    ("SUZU", "Suzuki"),
    ("TESL", "Tesla"),
    ("TOY", "Toyota"),
    ("VOLK", "Volkswagen"),
    ("VOLV", "Volvo"),
];

/// Display name for a manufacturer code, case-insensitive.
pub fn display_name(code: &str) -> Option<&'static str> {
    let code = code.trim();
    MAKES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}
