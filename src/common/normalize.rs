// src/common/normalize.rs

//! Máscaras de campos identificadores (CNPJ, CPF, telefone).
//!
//! Todas as funções derivam o resultado de `digits_only` da entrada, por isso
//! são idempotentes: formatar um valor já formatado devolve o mesmo valor.
//! Entradas curtas formatam progressivamente (como acontece enquanto o
//! usuário digita) e nunca falham.

pub const CNPJ_DIGITS: usize = 14;
pub const CPF_DIGITS: usize = 11;
pub const PHONE_MAX_DIGITS: usize = 11;

/// Remove tudo o que não for dígito ASCII.
pub fn digits_only(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Insere cada separador antes do dígito de índice `position`, apenas se
/// existirem dígitos suficientes para alcançá-lo.
fn with_separators(digits: &str, max: usize, separators: &[(usize, char)]) -> String {
    let mut out = String::with_capacity(max + separators.len());

    for (index, digit) in digits.chars().take(max).enumerate() {
        if let Some((_, sep)) = separators.iter().find(|(pos, _)| *pos == index) {
            out.push(*sep);
        }
        out.push(digit);
    }

    out
}

/// CNPJ: `NN.NNN.NNN/NNNN-NN`
pub fn format_cnpj(input: &str) -> String {
    with_separators(
        &digits_only(input),
        CNPJ_DIGITS,
        &[(2, '.'), (5, '.'), (8, '/'), (12, '-')],
    )
}

/// CPF: `NNN.NNN.NNN-NN`
pub fn format_cpf(input: &str) -> String {
    with_separators(
        &digits_only(input),
        CPF_DIGITS,
        &[(3, '.'), (6, '.'), (9, '-')],
    )
}

/// Telefone com DDD: `(DD) NNNN-NNNN` até 10 dígitos, `(DD) NNNNN-NNNN` com 11.
pub fn format_phone(input: &str) -> String {
    let digits: String = digits_only(input).chars().take(PHONE_MAX_DIGITS).collect();

    // Sem DDD completo ainda: devolve os dígitos crus
    if digits.len() < 2 {
        return digits;
    }

    let (area, number) = digits.split_at(2);
    if number.is_empty() {
        return format!("({area})");
    }

    // 11 dígitos = celular (prefixo de 5), senão fixo (prefixo de 4)
    let prefix_len = if digits.len() == PHONE_MAX_DIGITS { 5 } else { 4 };
    if number.len() <= prefix_len {
        return format!("({area}) {number}");
    }

    let (prefix, suffix) = number.split_at(prefix_len);
    format!("({area}) {prefix}-{suffix}")
}

/// Apara espaços; string vazia vira `None`.
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn cnpj_full_and_partial() {
        assert_eq!(format_cnpj("11222333000181"), "11.222.333/0001-81");
        assert_eq!(format_cnpj("11.222.333/0001-81"), "11.222.333/0001-81");
        assert_eq!(format_cnpj("11"), "11");
        assert_eq!(format_cnpj("112"), "11.2");
        assert_eq!(format_cnpj("11222333"), "11.222.333");
        assert_eq!(format_cnpj("112223330"), "11.222.333/0");
        assert_eq!(format_cnpj("1122233300018"), "11.222.333/0001-8");
        // excesso é truncado
        assert_eq!(format_cnpj("112223330001819999"), "11.222.333/0001-81");
        assert_eq!(format_cnpj(""), "");
    }

    #[test]
    fn cpf_full_and_partial() {
        assert_eq!(format_cpf("52998224725"), "529.982.247-25");
        assert_eq!(format_cpf("529"), "529");
        assert_eq!(format_cpf("5299"), "529.9");
        assert_eq!(format_cpf("5299822472"), "529.982.247-2");
        assert_eq!(format_cpf("abc529.982.247-25xyz"), "529.982.247-25");
    }

    #[test]
    fn phone_landline_and_mobile() {
        assert_eq!(format_phone("1133334444"), "(11) 3333-4444");
        assert_eq!(format_phone("11933334444"), "(11) 93333-4444");
        assert_eq!(format_phone("(11) 93333-4444"), "(11) 93333-4444");
        assert_eq!(format_phone("1"), "1");
        assert_eq!(format_phone("11"), "(11)");
        assert_eq!(format_phone("113"), "(11) 3");
        assert_eq!(format_phone("113333"), "(11) 3333");
        assert_eq!(format_phone("1133334"), "(11) 3333-4");
        assert_eq!(format_phone("119333344445555"), "(11) 93333-4444");
    }

    #[test]
    fn non_ascii_digits_are_ignored() {
        assert_eq!(digits_only("١٢٣ 45"), "45");
    }

    #[test]
    fn optional_fields_are_trimmed() {
        assert_eq!(normalize_optional(Some("  a  ")), Some("a".to_string()));
        assert_eq!(normalize_optional(Some("   ")), None);
        assert_eq!(normalize_optional(None), None);
    }

    proptest! {
        #[test]
        fn formatting_is_idempotent(s in ".{0,40}") {
            let once = format_cnpj(&s);
            prop_assert_eq!(format_cnpj(&once), once);

            let once = format_cpf(&s);
            prop_assert_eq!(format_cpf(&once), once);

            let once = format_phone(&s);
            prop_assert_eq!(format_phone(&once), once);
        }

        #[test]
        fn formatting_keeps_leading_digits(s in "[0-9a-z .()/-]{0,40}") {
            let digits = digits_only(&s);

            let expected: String = digits.chars().take(CNPJ_DIGITS).collect();
            prop_assert_eq!(digits_only(&format_cnpj(&s)), expected);

            let expected: String = digits.chars().take(CPF_DIGITS).collect();
            prop_assert_eq!(digits_only(&format_cpf(&s)), expected);

            let expected: String = digits.chars().take(PHONE_MAX_DIGITS).collect();
            prop_assert_eq!(digits_only(&format_phone(&s)), expected);
        }
    }
}
