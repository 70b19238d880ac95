//! Party placeholder substitution.

use shared_types::PartyProfile;

use crate::vocabulary::{
    ADDRESS_TOKEN, COMPANY_NAME_TOKEN, PHONE_TOKEN, RESPONSIBLE_PERSON_TOKEN, TAX_ID_TOKEN,
};

/// Token → value pairs for a profile.
pub fn placeholder_values(profile: &PartyProfile) -> [(&'static str, &str); 5] {
    [
        (COMPANY_NAME_TOKEN, profile.name.as_str()),
        (TAX_ID_TOKEN, profile.tax_id.as_str()),
        (ADDRESS_TOKEN, profile.address.as_str()),
        (PHONE_TOKEN, profile.phone.as_str()),
        (RESPONSIBLE_PERSON_TOKEN, profile.responsible_person.as_str()),
    ]
}

/// Replace every known token in `text`. Returns `None` when nothing changed.
///
/// Unknown `{{...}}` tokens are left as they are.
pub fn substitute(text: &str, profile: &PartyProfile) -> Option<String> {
    if !(text.contains("{{") && text.contains("}}")) {
        return None;
    }
    let mut out = text.to_string();
    for (token, value) in placeholder_values(profile) {
        if out.contains(token) {
            out = out.replace(token, value);
        }
    }
    (out != text).then_some(out)
}

#[cfg(test)]
pub(crate) fn sample_profile() -> PartyProfile {
    PartyProfile {
        id: "romashka".to_string(),
        name: "ООО «Ромашка»".to_string(),
        tax_id: "7701234567".to_string(),
        address: "г. Москва, ул. Ленина, д. 1".to_string(),
        phone: "+7 (495) 123-45-67".to_string(),
        responsible_person: "Иванов И.И.".to_string(),
        logo_path: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_substitutes_all_tokens() {
        let profile = sample_profile();
        let text = "{{COMPANY_NAME}}, ИНН {{INN}}; {{ADDRESS}}; {{PHONE}}; {{CEO}}";
        assert_eq!(
            substitute(text, &profile).unwrap(),
            "ООО «Ромашка», ИНН 7701234567; г. Москва, ул. Ленина, д. 1; +7 (495) 123-45-67; Иванов И.И."
        );
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(substitute("Коммерческое предложение", &sample_profile()), None);
    }

    #[test]
    fn test_unknown_token_kept() {
        assert_eq!(substitute("{{DATE}}", &sample_profile()), None);
        assert_eq!(
            substitute("{{DATE}} {{INN}}", &sample_profile()).unwrap(),
            "{{DATE}} 7701234567"
        );
    }
}
