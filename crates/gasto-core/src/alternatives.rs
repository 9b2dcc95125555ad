//! Cancellation alternatives
//!
//! Static catalog mapping detected services to free/cheaper alternatives or
//! a negotiation tip, surfaced next to each report line. Lookup is exact
//! key first, then substring either direction, then a generic three-tip
//! fallback.

use serde::{Deserialize, Serialize};

/// What kind of suggestion an alternative is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlternativeKind {
    Free,
    Cheaper,
    Tip,
}

impl AlternativeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Cheaper => "cheaper",
            Self::Tip => "tip",
        }
    }

    /// Display badge label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Free => "GRÁTIS",
            Self::Cheaper => "ECONOMIA",
            Self::Tip => "DICA",
        }
    }
}

impl std::str::FromStr for AlternativeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "cheaper" => Ok(Self::Cheaper),
            "tip" => Ok(Self::Tip),
            _ => Err(format!("Unknown alternative kind: {}", s)),
        }
    }
}

impl std::fmt::Display for AlternativeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One suggestion for replacing or renegotiating a subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AlternativeKind,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

type Row = (
    &'static str,
    AlternativeKind,
    &'static str,
    Option<&'static str>,
);

use AlternativeKind::{Cheaper, Free, Tip};

const CATALOG: &[(&str, &[Row])] = &[
    // Streaming de vídeo
    (
        "netflix",
        &[
            ("Pluto TV", Free, "Streaming gratuito com anúncios", Some("https://pluto.tv")),
            ("Tubi", Free, "Filmes e séries grátis", Some("https://tubitv.com")),
            ("Compartilhar conta", Tip, "Divida com familiares no mesmo endereço", None),
        ],
    ),
    (
        "disney",
        &[
            ("Assinar anual", Cheaper, "Economize até 16% pagando anual", None),
            ("Combo Disney+Star+", Tip, "Verifique se o combo compensa mais", None),
        ],
    ),
    (
        "hbo",
        &[
            ("Pluto TV", Free, "Conteúdo Warner gratuito", Some("https://pluto.tv")),
            ("Assinar via operadora", Cheaper, "Algumas operadoras incluem HBO grátis", None),
        ],
    ),
    (
        "prime",
        &[
            ("Frete grátis já compensa?", Tip, "Calcule se o frete grátis paga a assinatura", None),
            ("Prime Video avulso", Cheaper, "Só vídeo é mais barato que Prime completo", None),
        ],
    ),
    (
        "amazon",
        &[("Frete grátis já compensa?", Tip, "Calcule quantas compras faz por mês", None)],
    ),
    // Streaming de música
    (
        "spotify",
        &[
            ("Spotify Free", Free, "Versão gratuita com anúncios", None),
            ("YouTube Music", Free, "Versão gratuita disponível", None),
            ("Plano Família/Duo", Cheaper, "Divida o custo com outros", None),
        ],
    ),
    (
        "youtube",
        &[
            ("uBlock Origin", Free, "Bloqueador de anúncios para navegador", Some("https://ublockorigin.com")),
            ("Brave Browser", Free, "Navegador que bloqueia ads nativamente", Some("https://brave.com")),
            ("NewPipe (Android)", Free, "App alternativo sem anúncios", Some("https://newpipe.net")),
        ],
    ),
    (
        "deezer",
        &[
            ("Spotify Free", Free, "Alternativa gratuita com anúncios", None),
            ("YouTube Music", Free, "Versão gratuita disponível", None),
        ],
    ),
    (
        "apple music",
        &[
            ("Spotify Free", Free, "Alternativa gratuita com anúncios", None),
            ("YouTube Music", Free, "Versão gratuita disponível", None),
        ],
    ),
    // Software e produtividade
    (
        "adobe",
        &[
            ("Photopea", Free, "Editor online similar ao Photoshop", Some("https://photopea.com")),
            ("GIMP", Free, "Editor de imagens open source", Some("https://gimp.org")),
            ("Canva", Free, "Design simples e rápido", Some("https://canva.com")),
            ("DaVinci Resolve", Free, "Edição de vídeo profissional grátis", Some("https://blackmagicdesign.com/davinciresolve")),
        ],
    ),
    (
        "microsoft",
        &[
            ("Google Docs/Sheets", Free, "Suite office gratuita online", Some("https://docs.google.com")),
            ("LibreOffice", Free, "Suite office open source", Some("https://libreoffice.org")),
        ],
    ),
    (
        "office",
        &[
            ("Google Workspace", Free, "Docs, Sheets, Slides grátis", Some("https://docs.google.com")),
            ("LibreOffice", Free, "Suite completa open source", Some("https://libreoffice.org")),
        ],
    ),
    (
        "canva",
        &[
            ("Canva Free", Free, "Versão gratuita já é muito boa", None),
            ("Figma", Free, "Plano gratuito para uso pessoal", Some("https://figma.com")),
        ],
    ),
    (
        "figma",
        &[
            ("Figma Free", Free, "Plano gratuito para até 3 projetos", None),
            ("Penpot", Free, "Alternativa open source", Some("https://penpot.app")),
        ],
    ),
    // IA
    (
        "chatgpt",
        &[
            ("ChatGPT Free", Free, "GPT-3.5 é gratuito e bom para maioria dos casos", None),
            ("Claude", Free, "IA da Anthropic com plano free", Some("https://claude.ai")),
            ("Gemini", Free, "IA do Google gratuita", Some("https://gemini.google.com")),
            ("Perplexity", Free, "IA para pesquisas", Some("https://perplexity.ai")),
        ],
    ),
    (
        "openai",
        &[
            ("ChatGPT Free", Free, "Use a versão gratuita", None),
            ("Claude/Gemini", Free, "Alternativas gratuitas de qualidade", None),
        ],
    ),
    // Armazenamento
    (
        "icloud",
        &[
            ("Google Drive 15GB", Free, "15GB gratuitos", Some("https://drive.google.com")),
            ("Limpar fotos", Tip, "Delete duplicatas e vídeos antigos", None),
        ],
    ),
    (
        "google",
        &[
            ("Limpar Gmail", Tip, "Emails antigos ocupam espaço", None),
            ("Google Photos compacto", Tip, "Use qualidade \"Economia\" para não usar cota", None),
        ],
    ),
    (
        "dropbox",
        &[
            ("Google Drive", Free, "15GB grátis vs 2GB do Dropbox", Some("https://drive.google.com")),
            ("OneDrive", Free, "5GB grátis", Some("https://onedrive.live.com")),
        ],
    ),
    // Academia e saúde
    (
        "smart fit",
        &[
            ("Treino em casa", Free, "YouTube tem milhares de treinos grátis", None),
            ("Parques públicos", Free, "Academias ao ar livre em parques", None),
            ("Plano básico", Cheaper, "Verifique se precisa do plano Black", None),
        ],
    ),
    (
        "gympass",
        &[
            ("Contrato direto com academia", Cheaper, "Às vezes sai mais barato", None),
            ("Smart Fit básico", Cheaper, "Se usa só uma academia", None),
        ],
    ),
    // Delivery e transporte
    (
        "ifood",
        &[
            ("Ligar diretamente", Cheaper, "Restaurantes têm preços menores fora do app", None),
            ("Cozinhar em casa", Free, "Economize até 70% preparando em casa", None),
        ],
    ),
    (
        "rappi",
        &[
            ("Comparar preços", Tip, "Compare com iFood e 99Food", None),
            ("Mercado direto", Cheaper, "Compras de mercado saem mais baratas presencialmente", None),
        ],
    ),
    (
        "uber",
        &[
            ("99", Cheaper, "Compare preços entre apps", None),
            ("Transporte público", Free, "Muito mais barato para trajetos regulares", None),
        ],
    ),
    // Games
    (
        "xbox",
        &[
            ("Epic Games grátis", Free, "Jogos grátis toda semana", Some("https://epicgames.com")),
            ("Humble Bundle", Cheaper, "Pacotes com até 90% off", Some("https://humblebundle.com")),
        ],
    ),
    (
        "playstation",
        &[
            ("PS Plus Essential", Cheaper, "Plano mais barato se não usa catálogo", None),
            ("Jogos físicos usados", Cheaper, "OLX e Mercado Livre", None),
        ],
    ),
    (
        "steam",
        &[
            ("Epic Games grátis", Free, "Jogos grátis semanalmente", Some("https://epicgames.com")),
            ("Aguardar promoções", Tip, "Steam sale tem até 90% off", None),
        ],
    ),
    // Relacionamento
    (
        "tinder",
        &[
            ("Bumble Free", Free, "Funcionalidades básicas grátis", None),
            ("Hinge", Free, "Foco em relacionamentos sérios", None),
        ],
    ),
    // Educação
    (
        "udemy",
        &[
            ("YouTube", Free, "Milhares de cursos gratuitos", None),
            ("FreeCodeCamp", Free, "Programação gratuita de qualidade", Some("https://freecodecamp.org")),
            ("Aguardar promoções", Tip, "Udemy sempre tem cursos a R$27,90", None),
        ],
    ),
    (
        "coursera",
        &[
            ("Auditar cursos", Free, "Conteúdo grátis sem certificado", None),
            ("edX", Free, "Cursos de Harvard/MIT grátis", Some("https://edx.org")),
        ],
    ),
    (
        "duolingo",
        &[
            ("Duolingo Free", Free, "Versão gratuita é suficiente para aprender", None),
            ("YouTube/Podcasts", Free, "Conteúdo nativo do idioma", None),
        ],
    ),
];

const GENERIC_TIPS: &[Row] = &[
    ("Avaliar necessidade", Tip, "Você realmente usa este serviço?", None),
    ("Buscar alternativas grátis", Tip, "Pesquise por \"[nome] free alternative\"", None),
    ("Negociar desconto", Tip, "Entre em contato e peça desconto para renovar", None),
];

/// Look up alternatives for a detected service name
///
/// Exact key match first, then substring either direction (so
/// "Smart Fit Academia" still hits "smart fit"), then generic tips.
/// An empty name goes straight to the generic tips.
pub fn suggest(service_name: &str) -> Vec<Alternative> {
    let name = service_name.trim().to_lowercase();

    if !name.is_empty() {
        if let Some((_, rows)) = CATALOG.iter().find(|(key, _)| *key == name) {
            return rows.iter().map(to_alternative).collect();
        }

        for (key, rows) in CATALOG {
            if name.contains(key) || key.contains(name.as_str()) {
                return rows.iter().map(to_alternative).collect();
            }
        }
    }

    GENERIC_TIPS.iter().map(to_alternative).collect()
}

fn to_alternative(row: &Row) -> Alternative {
    let (name, kind, description, url) = *row;
    Alternative {
        name: name.to_string(),
        kind,
        description: description.to_string(),
        url: url.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_exact_match() {
        let alternatives = suggest("netflix");
        assert_eq!(alternatives.len(), 3);
        assert_eq!(alternatives[0].name, "Pluto TV");
        assert_eq!(alternatives[0].kind, AlternativeKind::Free);
        assert_eq!(alternatives[0].url.as_deref(), Some("https://pluto.tv"));
    }

    #[test]
    fn test_suggest_is_case_insensitive() {
        assert_eq!(suggest("NETFLIX"), suggest("netflix"));
        assert_eq!(suggest("  Netflix  "), suggest("netflix"));
    }

    #[test]
    fn test_suggest_substring_match() {
        // Detected names are longer than catalog keys
        let alternatives = suggest("Netflix Premium");
        assert_eq!(alternatives[0].name, "Pluto TV");

        let alternatives = suggest("Smart Fit Academia");
        assert_eq!(alternatives[0].name, "Treino em casa");

        let alternatives = suggest("iCloud+ 200GB");
        assert_eq!(alternatives[0].name, "Google Drive 15GB");
    }

    #[test]
    fn test_suggest_reverse_substring_match() {
        // Short queries can also hit a longer catalog key
        let alternatives = suggest("fit");
        assert_eq!(alternatives[0].name, "Treino em casa");
    }

    #[test]
    fn test_suggest_unknown_gets_generic_tips() {
        let alternatives = suggest("Serviço Obscuro LTDA");
        assert_eq!(alternatives.len(), 3);
        assert!(alternatives.iter().all(|a| a.kind == AlternativeKind::Tip));
        assert_eq!(alternatives[0].name, "Avaliar necessidade");
    }

    #[test]
    fn test_suggest_empty_gets_generic_tips() {
        let alternatives = suggest("");
        assert_eq!(alternatives.len(), 3);
        assert!(alternatives.iter().all(|a| a.kind == AlternativeKind::Tip));
    }

    #[test]
    fn test_alternative_serde_shape() {
        let alternative = suggest("netflix").remove(0);
        let json = serde_json::to_value(&alternative).unwrap();

        assert_eq!(json["type"], "free");
        assert_eq!(json["name"], "Pluto TV");
        assert_eq!(json["url"], "https://pluto.tv");

        // url omitted when absent
        let tip = suggest("unknown-service").remove(0);
        let json = serde_json::to_value(&tip).unwrap();
        assert!(json.get("url").is_none());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(AlternativeKind::Free.label(), "GRÁTIS");
        assert_eq!(AlternativeKind::Cheaper.label(), "ECONOMIA");
        assert_eq!(AlternativeKind::Tip.label(), "DICA");
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("free".parse::<AlternativeKind>().unwrap(), AlternativeKind::Free);
        assert_eq!("CHEAPER".parse::<AlternativeKind>().unwrap(), AlternativeKind::Cheaper);
        assert!("promo".parse::<AlternativeKind>().is_err());
    }
}
