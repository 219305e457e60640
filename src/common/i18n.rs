// src/common/i18n.rs

use crate::middleware::i18n::Locale;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    Pt,
    En,
}

impl Lang {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "pt" => Some(Lang::Pt),
            "en" => Some(Lang::En),
            _ => None,
        }
    }
}

// Mensagens por código de erro. O código é o mesmo devolvido no campo "code".
const PT: &[(&str, &str)] = &[
    ("validation_error", "Um ou mais campos são inválidos."),
    ("record_invalid", "O registro contém campos inválidos."),
    ("email_already_exists", "Este e-mail já está em uso."),
    ("invalid_credentials", "E-mail ou senha inválidos."),
    ("invalid_token", "Token de autenticação inválido ou ausente."),
    ("access_pending", "Seu acesso será liberado em breve. Aguarde a aprovação de um administrador."),
    ("not_admin", "Você não tem permissão para acessar o painel administrativo."),
    ("permission_denied", "Você precisa da permissão '{permission}' para realizar esta ação."),
    ("not_owner", "Somente o dono pode excluir este negócio."),
    ("action_not_permitted", "Ação não permitida: você não pode revogar ou excluir o seu próprio acesso."),
    ("not_found", "Não encontrado."),
    ("missing_business", "O cabeçalho X-Business-ID é obrigatório."),
    ("invalid_business", "Cabeçalho X-Business-ID inválido (não é um UUID)."),
    ("confirmation_required", "Esta ação é destrutiva e precisa ser confirmada (confirm=true)."),
    ("invalid_backup", "Formato de backup inválido."),
    ("local_save_failed", "Não foi possível salvar os dados localmente. Tente novamente."),
    ("backend_timeout", "O serviço remoto não respondeu a tempo."),
    ("backend_error", "Erro no serviço remoto"),
    ("internal_error", "Ocorreu um erro inesperado."),
];

const EN: &[(&str, &str)] = &[
    ("validation_error", "One or more fields are invalid."),
    ("record_invalid", "The record contains invalid fields."),
    ("email_already_exists", "This e-mail is already in use."),
    ("invalid_credentials", "Invalid e-mail or password."),
    ("invalid_token", "Missing or invalid authentication token."),
    ("access_pending", "Your access will be granted soon. Wait for an administrator's approval."),
    ("not_admin", "You are not allowed to access the admin panel."),
    ("permission_denied", "You need the '{permission}' permission to perform this action."),
    ("not_owner", "Only the owner can delete this business."),
    ("action_not_permitted", "Action not permitted: you cannot revoke or delete your own access."),
    ("not_found", "Not found."),
    ("missing_business", "The X-Business-ID header is required."),
    ("invalid_business", "Invalid X-Business-ID header (not a UUID)."),
    ("confirmation_required", "This is a destructive action and must be confirmed (confirm=true)."),
    ("invalid_backup", "Invalid backup format."),
    ("local_save_failed", "Could not save data locally. Please try again."),
    ("backend_timeout", "The remote service did not answer in time."),
    ("backend_error", "Remote service error"),
    ("internal_error", "An unexpected error occurred."),
];

/// Tabelas de mensagens traduzidas. O idioma padrão é português.
#[derive(Debug, Clone, Copy)]
pub struct I18nStore {
    fallback: Lang,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self { fallback: Lang::Pt }
    }
}

impl I18nStore {
    pub fn new(fallback: Lang) -> Self {
        Self { fallback }
    }

    pub fn lang(&self, locale: &Locale) -> Lang {
        Lang::from_tag(&locale.0).unwrap_or(self.fallback)
    }

    pub fn translate(&self, locale: &Locale, code: &str) -> &'static str {
        let table = |lang| match lang {
            Lang::Pt => PT,
            Lang::En => EN,
        };

        let find = |lang| {
            table(lang)
                .iter()
                .find(|(key, _)| *key == code)
                .map(|(_, msg)| *msg)
        };

        find(self.lang(locale))
            .or_else(|| find(self.fallback))
            .unwrap_or("Ocorreu um erro inesperado.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_portuguese() {
        let store = I18nStore::default();

        assert_eq!(store.translate(&Locale("en".into()), "not_found"), "Not found.");
        assert_eq!(store.translate(&Locale("de".into()), "not_found"), "Não encontrado.");
    }

    #[test]
    fn both_tables_cover_the_same_codes() {
        for (code, _) in PT {
            assert!(EN.iter().any(|(k, _)| k == code), "sem tradução: {code}");
        }
        assert_eq!(PT.len(), EN.len());
    }
}
