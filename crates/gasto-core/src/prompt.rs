//! Extraction prompt
//!
//! The instruction text is a product contract: it names the disguised
//! merchant spellings the analysis must catch and pins the reply to the
//! compact `{"subs":[{n,v,c}]}` wire shape. Every provider adapter sends
//! the same prompt; only the role wrapping differs per API.

/// System-role line for chat-style providers.
pub const SYSTEM_PROMPT: &str =
    "Você é um assistente que analisa extratos bancários e retorna APENAS JSON válido.";

const INSTRUCTIONS: &str = r#"Analise o extrato bancário e liste APENAS assinaturas recorrentes (Netflix, Spotify, Adobe, etc).
ATENÇÃO PARA NOMES CAMUFLADOS:
  - "Apple.com/Bill" ou "Apple Services"
  - "Google *Services", "Google *Storage", "Google Play"
  - "Paypal *NomeDoServico"
  - "PAGSEGURO *Nome", "MP *Nome", "IUGU *Nome"
  - "Amazon Prime", "Amazon Digital"

IGNORAR: iFood, Uber, PIX, transferências, compras únicas.
INCLUIR: Streaming, SaaS, Apps, Academias, Jogos.

Responda APENAS com JSON no formato: {"subs": [{"n": "nome", "v": valor, "c": "categoria"}]}

Texto:
"""
"#;

/// Embeds normalized statement text into the fixed instruction block.
pub fn build_prompt(normalized: &str) -> String {
    let mut prompt = String::with_capacity(INSTRUCTIONS.len() + normalized.len() + 8);
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str(normalized);
    prompt.push_str("\n\"\"\"");
    prompt
}
