// src/personas.rs

use ratatui::style::Color;

/// A predefined customer archetype the chat is scoped to.
#[derive(Debug, PartialEq, Eq)]
pub struct Persona {
    pub id: &'static str,
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    pub avatar: &'static str,
    pub suggestions: &'static [&'static str],
}

const RESEARCH_NOTE: &str = "Відповіді базуються виключно на внутрішніх дослідженнях з клієнтами.";

pub static PERSONAS: [Persona; 4] = [
    Persona {
        id: "business-owner",
        name: "Business Owner",
        display_name: "Business Owner",
        description: RESEARCH_NOTE,
        color: "#00A599",
        avatar: "/Persona_Card-buisiness_owner.png",
        suggestions: &[
            "З якими проблемами зустрічаєшся?",
            "Яких продуктів та сервісів не вистачає?",
            "У чому для тебе цінність банку Південний?",
        ],
    },
    Persona {
        id: "digital-nomad",
        name: "Digital Nomad",
        display_name: "Digital Nomad",
        description: RESEARCH_NOTE,
        color: "#2DADA4",
        avatar: "/Persona_Card-digital_nomad.png",
        suggestions: &[
            "Як часто використовуєш мобільний банкінг?",
            "Які функції найбільш важливі для тебе?",
            "Чи зручно керувати фінансами в дорозі?",
        ],
    },
    Persona {
        id: "top-manager",
        name: "Top Manager",
        display_name: "Top Manager",
        description: RESEARCH_NOTE,
        color: "#284541",
        avatar: "/Persona_Card-top_manager.png",
        suggestions: &[
            "Вам потрібен преміум менеджер?",
            "Які інвестиційні можливості цікавлять?",
            "Як оцінюєте рівень сервісу?",
        ],
    },
    Persona {
        id: "digital-resident",
        name: "Digital Resident",
        display_name: "Digital Resident",
        description: RESEARCH_NOTE,
        color: "#ECF0EF",
        avatar: "/Persona_Card-digital_resident.png",
        suggestions: &[
            "Як часто використовуєш онлайн-платежі?",
            "Чи зручний інтерфейс банківського додатку?",
            "Які додаткові послуги потрібні?",
        ],
    },
];

pub fn all() -> &'static [Persona] {
    &PERSONAS
}

pub fn find_persona(id: &str) -> Option<&'static Persona> {
    PERSONAS.iter().find(|p| p.id == id)
}

/// Maps a persona id to the short code the webhook workflow expects.
/// Unknown ids are passed through unchanged.
pub fn webhook_code(id: &str) -> &str {
    match id {
        "top-manager" => "ТОП",
        "business-owner" => "КБС",
        "digital-resident" => "ТОП",
        "digital-nomad" => "КБС",
        other => other,
    }
}

impl Persona {
    pub fn greeting(&self) -> String {
        format!("Привіт! Я {}. Чим можу допомогти?", self.display_name)
    }

    /// Card color parsed from the hex string; falls back to the brand text color.
    pub fn card_color(&self) -> Color {
        parse_hex(self.color).unwrap_or(crate::constants::TEXT)
    }

    /// Light cards need dark text on top of them.
    pub fn is_light(&self) -> bool {
        match self.card_color() {
            Color::Rgb(r, g, b) => (r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000 > 160,
            _ => false,
        }
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_persona_resolves_back_to_itself() {
        for persona in all() {
            let found = find_persona(persona.id).expect("persona should resolve");
            assert!(std::ptr::eq(found, persona));
        }
    }

    #[test]
    fn persona_ids_are_unique() {
        let ids: HashSet<_> = all().iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), all().len());
        assert_eq!(all().len(), 4);
    }

    #[test]
    fn every_persona_has_three_suggestions() {
        assert!(all().iter().all(|p| p.suggestions.len() == 3));
    }

    #[test]
    fn webhook_codes_cover_all_personas() {
        assert_eq!(webhook_code("top-manager"), "ТОП");
        assert_eq!(webhook_code("business-owner"), "КБС");
        assert_eq!(webhook_code("digital-resident"), "ТОП");
        assert_eq!(webhook_code("digital-nomad"), "КБС");
    }

    #[test]
    fn unknown_persona_code_falls_back_to_id() {
        assert_eq!(webhook_code("retired-investor"), "retired-investor");
        assert!(find_persona("retired-investor").is_none());
    }

    #[test]
    fn card_colors_parse_from_hex() {
        let owner = find_persona("business-owner").unwrap();
        assert_eq!(owner.card_color(), Color::Rgb(0x00, 0xA5, 0x99));
        assert!(!owner.is_light());
        assert!(find_persona("digital-resident").unwrap().is_light());
    }

    #[test]
    fn greeting_names_the_persona() {
        let manager = find_persona("top-manager").unwrap();
        assert_eq!(manager.greeting(), "Привіт! Я Top Manager. Чим можу допомогти?");
    }
}
