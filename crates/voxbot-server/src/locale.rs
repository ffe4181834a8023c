//! Localized user-facing strings.
//!
//! The pipeline itself is locale-agnostic; only the handful of replies the
//! bot sends are localized here. Russian is served to language codes from
//! CIS countries, everything else falls back to English.

use voxbot_pipeline::ValidationFailure;

/// Language codes that receive the Russian variant.
const CIS_LANGS: &[&str] = &["ab", "be", "kk", "ky", "ru"];

/// Picks the Russian or default variant based on the requester's language
/// code. A missing code falls back to the default.
pub fn localized<'a>(lang: Option<&str>, ru: &'a str, default: &'a str) -> &'a str {
    match lang {
        Some(code) if CIS_LANGS.iter().any(|l| code.starts_with(l)) => ru,
        _ => default,
    }
}

/// Reason text for a rejected request.
pub fn validation_reason(lang: Option<&str>, failure: ValidationFailure) -> &'static str {
    match failure {
        ValidationFailure::EmptyText => {
            localized(lang, "В сообщении нет текста", "There is no text")
        }
        ValidationFailure::UnpairedBracket => localized(
            lang,
            "Обнаружена незакрытая скобка '['",
            "Detected unpaired bracket symbol '['",
        ),
    }
}

pub fn invalid_arguments(lang: Option<&str>) -> &'static str {
    localized(
        lang,
        "Ошибка: неверные аргументы команды",
        "Error: invalid arguments provided",
    )
}

pub fn access_denied(lang: Option<&str>) -> &'static str {
    localized(
        lang,
        "В доступе отказано, к сожалению это частный бот",
        "Sorry, it's a private bot, access denied",
    )
}

pub fn synthesis_failed(lang: Option<&str>) -> &'static str {
    localized(
        lang,
        "Не удалось синтезировать аудио, попробуйте ещё раз",
        "Audio generation failed, please try again",
    )
}

pub fn server_error(lang: Option<&str>) -> &'static str {
    localized(lang, "Внутренняя ошибка сервера", "Server Internal Error")
}

pub fn sample_saved(lang: Option<&str>) -> &'static str {
    localized(lang, "Образец голоса сохранён", "Voice sample saved")
}

pub fn help_text(lang: Option<&str>) -> &'static str {
    localized(
        lang,
        "Команды:\n/say <голос> <текст> — синтезировать аудио\n\
         Отправьте аудиофайл, чтобы сохранить образец голоса",
        "Commands:\n/say <voice> <text> — synthesize audio\n\
         Send an audio file to store a voice sample",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cis_codes_get_russian() {
        assert_eq!(localized(Some("ru"), "да", "yes"), "да");
        assert_eq!(localized(Some("ru-RU"), "да", "yes"), "да");
        assert_eq!(localized(Some("kk"), "да", "yes"), "да");
    }

    #[test]
    fn other_codes_and_missing_get_default() {
        assert_eq!(localized(Some("en"), "да", "yes"), "yes");
        assert_eq!(localized(Some("de-DE"), "да", "yes"), "yes");
        assert_eq!(localized(None, "да", "yes"), "yes");
    }

    #[test]
    fn validation_reasons_cover_both_failures() {
        assert_eq!(
            validation_reason(None, ValidationFailure::EmptyText),
            "There is no text"
        );
        assert!(validation_reason(Some("ru"), ValidationFailure::UnpairedBracket)
            .contains("скобка"));
    }
}
