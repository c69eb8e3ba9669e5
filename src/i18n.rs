//! Localization table: language → key → template string.
//!
//! Templates use `{}` placeholders filled positionally by [`tf`].
use crate::model::Language;

/// Every translatable UI string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    AppTitle,
    FavoritesTitle,
    LoadingFacts,
    LoadingImages,
    ErrorTitle,
    ErrorFetch,
    RetryHint,
    AllSeenTitle,
    SummonMessage,
    SummonButton,
    FavoritesEmpty,
    NoResultsFound,
    SearchPlaceholder,
    AllCategories,
    MatchCount,
    Shuffled,
    TtsError,
    ReadAloud,
    PauseSpeech,
    ResumeSpeech,
    SpeechLoading,
    Favorite,
    Unfavorite,
    AddedToFavorites,
    RemovedFromFavorites,
    Muted,
    Unmuted,
    NarrationDucking,
    VideoLink,
    NoVideo,
    CoverReady,
    CoverMissing,
    CoverOpenFailed,
    VideoOpenFailed,
    ShareFactTitle,
    CopySuccess,
    CopyFail,
    OnboardingTitle1,
    OnboardingText1,
    OnboardingTitle2,
    OnboardingText2,
    OnboardingTitle3,
    OnboardingText3,
    OnboardingTitle4,
    OnboardingText4,
    OnboardingTitle5,
    OnboardingText5,
    OnboardingNext,
    OnboardingFinish,
    DeckHints,
    DetailHints,
    FavoritesHints,
    SearchHints,
}

/// Look up the template for `key` in `lang`.
pub fn t(lang: Language, key: Key) -> &'static str {
    match lang {
        Language::En => en(key),
        Language::Fr => fr(key),
    }
}

/// Look up and fill `{}` placeholders in order. Missing arguments leave
/// the placeholder empty; extra arguments are ignored.
pub fn tf(lang: Language, key: Key, args: &[&str]) -> String {
    let template = t(lang, key);
    let mut out = String::with_capacity(template.len() + 16);
    let mut args = args.iter();
    let mut rest = template;
    while let Some(idx) = rest.find("{}") {
        out.push_str(&rest[..idx]);
        if let Some(arg) = args.next() {
            out.push_str(arg);
        }
        rest = &rest[idx + 2..];
    }
    out.push_str(rest);
    out
}

/// Initial language: explicit choice, else the `LANG` environment variable,
/// else English.
pub fn initial_language(explicit: Option<&str>) -> Language {
    explicit
        .and_then(Language::from_code)
        .or_else(|| {
            std::env::var("LANG")
                .ok()
                .and_then(|lang| Language::from_code(&lang))
        })
        .unwrap_or_default()
}

/// The onboarding steps as (title, text) pairs.
pub const ONBOARDING_STEPS: [(Key, Key); 5] = [
    (Key::OnboardingTitle1, Key::OnboardingText1),
    (Key::OnboardingTitle2, Key::OnboardingText2),
    (Key::OnboardingTitle3, Key::OnboardingText3),
    (Key::OnboardingTitle4, Key::OnboardingText4),
    (Key::OnboardingTitle5, Key::OnboardingText5),
];

fn en(key: Key) -> &'static str {
    match key {
        Key::AppTitle => "Paranormal Facts",
        Key::FavoritesTitle => "Favorites",
        Key::LoadingFacts => "Summoning paranormal facts...",
        Key::LoadingImages => "Conjuring eerie images ({}/{})...",
        Key::ErrorTitle => "Something went wrong",
        Key::ErrorFetch => "Failed to fetch paranormal facts. Please try again later.",
        Key::RetryHint => "Press [r] to try again",
        Key::AllSeenTitle => "You've seen it all... for now.",
        Key::SummonMessage => "Summon more spooky facts from the other side.",
        Key::SummonButton => "[n] Summon more",
        Key::FavoritesEmpty => "No favorites yet. Press [f] on a card to save it.",
        Key::NoResultsFound => "No favorites match your search.",
        Key::SearchPlaceholder => "Search favorites...",
        Key::AllCategories => "All",
        Key::MatchCount => "{} of {}",
        Key::Shuffled => "Shuffled",
        Key::TtsError => "Could not generate audio. Press [space] to retry.",
        Key::ReadAloud => "Read aloud",
        Key::PauseSpeech => "Pause",
        Key::ResumeSpeech => "Resume",
        Key::SpeechLoading => "Preparing narration...",
        Key::Favorite => "Add to favorites",
        Key::Unfavorite => "Remove from favorites",
        Key::AddedToFavorites => "Added \"{}\" to favorites",
        Key::RemovedFromFavorites => "Removed \"{}\" from favorites",
        Key::Muted => "Music muted",
        Key::Unmuted => "Music on",
        Key::NarrationDucking => "Music ducked for narration",
        Key::VideoLink => "Video: {}",
        Key::NoVideo => "No video available",
        Key::CoverReady => "Cover image ready",
        Key::CoverMissing => "Cover image not available",
        Key::CoverOpenFailed => "Could not open cover image",
        Key::VideoOpenFailed => "Could not open video link",
        Key::ShareFactTitle => "Paranormal fact: {}",
        Key::CopySuccess => "Fact copied to clipboard!",
        Key::CopyFail => "Could not copy the fact",
        Key::OnboardingTitle1 => "Welcome to the other side",
        Key::OnboardingText1 => "Discover real-world paranormal facts, freshly summoned for you.",
        Key::OnboardingTitle2 => "Swipe to explore",
        Key::OnboardingText2 => "Use [h] and [l] (or the arrow keys) to swipe to the next card.",
        Key::OnboardingTitle3 => "Dig deeper",
        Key::OnboardingText3 => "Press [Enter] on a card for the full story and narration.",
        Key::OnboardingTitle4 => "Keep your favorites",
        Key::OnboardingText4 => "Press [f] to save a fact and find it later in your favorites.",
        Key::OnboardingTitle5 => "Make it yours",
        Key::OnboardingText5 => "Switch language with [L], open favorites with [b], mute music with [m].",
        Key::OnboardingNext => "[Enter] Next",
        Key::OnboardingFinish => "[Enter] Start exploring",
        Key::DeckHints => "[h/l]swipe [Enter]details [f]avorite [c]opy [b]ookmarks [L]ang [m]ute [?]help [q]uit",
        Key::DetailHints => "[Esc]back [space]narrate [x]pause [f]avorite [o]pen video [i]mage [c]opy [q]uit",
        Key::FavoritesHints => "[/]search [1-9]category [0]all [s]huffle [Enter]details [Esc]back",
        Key::SearchHints => "Type to search | [Esc] clear | [Enter] done",
    }
}

fn fr(key: Key) -> &'static str {
    match key {
        Key::AppTitle => "Faits Paranormaux",
        Key::FavoritesTitle => "Favoris",
        Key::LoadingFacts => "Invocation de faits paranormaux...",
        Key::LoadingImages => "Création d'images étranges ({}/{})...",
        Key::ErrorTitle => "Une erreur est survenue",
        Key::ErrorFetch => "Impossible de récupérer les faits paranormaux. Veuillez réessayer plus tard.",
        Key::RetryHint => "Appuyez sur [r] pour réessayer",
        Key::AllSeenTitle => "Vous avez tout vu... pour l'instant.",
        Key::SummonMessage => "Invoquez d'autres faits étranges de l'au-delà.",
        Key::SummonButton => "[n] En invoquer d'autres",
        Key::FavoritesEmpty => "Aucun favori. Appuyez sur [f] sur une carte pour l'enregistrer.",
        Key::NoResultsFound => "Aucun favori ne correspond à votre recherche.",
        Key::SearchPlaceholder => "Rechercher dans les favoris...",
        Key::AllCategories => "Tous",
        Key::MatchCount => "{} sur {}",
        Key::Shuffled => "Mélangé",
        Key::TtsError => "Impossible de générer l'audio. Appuyez sur [espace] pour réessayer.",
        Key::ReadAloud => "Lire à voix haute",
        Key::PauseSpeech => "Pause",
        Key::ResumeSpeech => "Reprendre",
        Key::SpeechLoading => "Préparation de la narration...",
        Key::Favorite => "Ajouter aux favoris",
        Key::Unfavorite => "Retirer des favoris",
        Key::AddedToFavorites => "« {} » ajouté aux favoris",
        Key::RemovedFromFavorites => "« {} » retiré des favoris",
        Key::Muted => "Musique coupée",
        Key::Unmuted => "Musique activée",
        Key::NarrationDucking => "Musique atténuée pendant la narration",
        Key::VideoLink => "Vidéo : {}",
        Key::NoVideo => "Aucune vidéo disponible",
        Key::CoverReady => "Image de couverture prête",
        Key::CoverMissing => "Image de couverture indisponible",
        Key::CoverOpenFailed => "Impossible d'ouvrir l'image",
        Key::VideoOpenFailed => "Impossible d'ouvrir la vidéo",
        Key::ShareFactTitle => "Fait paranormal : {}",
        Key::CopySuccess => "Fait copié dans le presse-papiers !",
        Key::CopyFail => "Impossible de copier le fait",
        Key::OnboardingTitle1 => "Bienvenue de l'autre côté",
        Key::OnboardingText1 => "Découvrez des faits paranormaux réels, invoqués rien que pour vous.",
        Key::OnboardingTitle2 => "Balayez pour explorer",
        Key::OnboardingText2 => "Utilisez [h] et [l] (ou les flèches) pour passer à la carte suivante.",
        Key::OnboardingTitle3 => "Creusez le mystère",
        Key::OnboardingText3 => "Appuyez sur [Entrée] pour l'histoire complète et la narration.",
        Key::OnboardingTitle4 => "Gardez vos favoris",
        Key::OnboardingText4 => "Appuyez sur [f] pour enregistrer un fait et le retrouver plus tard.",
        Key::OnboardingTitle5 => "Personnalisez",
        Key::OnboardingText5 => "Changez de langue avec [L], ouvrez les favoris avec [b], coupez la musique avec [m].",
        Key::OnboardingNext => "[Entrée] Suivant",
        Key::OnboardingFinish => "[Entrée] Commencer l'exploration",
        Key::DeckHints => "[h/l]balayer [Entrée]détails [f]avori [c]opier [b]favoris [L]angue [m]uet [?]aide [q]uitter",
        Key::DetailHints => "[Échap]retour [espace]narrer [x]pause [f]avori [o]vidéo [i]mage [c]opier [q]uitter",
        Key::FavoritesHints => "[/]chercher [1-9]catégorie [0]tous [s]mélanger [Entrée]détails [Échap]retour",
        Key::SearchHints => "Tapez pour chercher | [Échap] effacer | [Entrée] valider",
    }
}
