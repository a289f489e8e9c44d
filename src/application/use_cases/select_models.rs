use std::collections::HashSet;

use tracing::debug;

use crate::application::ProviderDescriptor;
use crate::domain::Category;

/// Fitness of a provider tagged with the requested category.
pub const CATEGORY_MATCH_WEIGHT: u32 = 3;
/// Fitness of a provider whose strength label relates to the category.
pub const STRENGTH_MATCH_WEIGHT: u32 = 2;
/// Fitness of every other provider.
pub const BASE_WEIGHT: u32 = 1;

/// Strength-label keywords considered thematically related to a category.
fn strength_keywords(category: Category) -> &'static [&'static str] {
    match category {
        Category::Code => &["code", "coding", "program", "debug", "software"],
        Category::Realtime => &["real-time", "realtime", "current", "news", "live"],
        Category::Search => &["search", "research", "web", "information", "citation"],
        Category::Multimodal => &["image", "vision", "visual", "multimodal"],
        Category::Analysis => &["analysis", "analytical", "reasoning", "review"],
        Category::General => &["general", "versatile", "conversation", "chat"],
    }
}

/// Fitness tier of `descriptor` for `category`.
pub fn fitness(descriptor: &ProviderDescriptor, category: Category) -> u32 {
    if descriptor.category() == category {
        return CATEGORY_MATCH_WEIGHT;
    }

    let strength = descriptor.strength().to_lowercase();
    if strength_keywords(category)
        .iter()
        .any(|keyword| strength.contains(keyword))
    {
        return STRENGTH_MATCH_WEIGHT;
    }

    BASE_WEIGHT
}

/// Human-readable name of the fitness tier, for listings.
pub fn fitness_label(descriptor: &ProviderDescriptor, category: Category) -> &'static str {
    match fitness(descriptor, category) {
        CATEGORY_MATCH_WEIGHT => "category match",
        STRENGTH_MATCH_WEIGHT => "strength match",
        _ => "general fit",
    }
}

/// Rank `registry` by fitness for `category` and return at most `count` providers.
///
/// The sort is stable, so equally fit providers keep declaration order.
/// A registry smaller than `count` simply yields fewer providers.
pub fn select(
    category: Category,
    count: usize,
    registry: &[ProviderDescriptor],
) -> Vec<ProviderDescriptor> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<(u32, &ProviderDescriptor)> = registry
        .iter()
        .filter(|descriptor| seen.insert(descriptor.id()))
        .map(|descriptor| (fitness(descriptor, category), descriptor))
        .collect();

    ranked.sort_by(|a, b| b.0.cmp(&a.0));

    let selected: Vec<ProviderDescriptor> = ranked
        .into_iter()
        .take(count)
        .map(|(_, descriptor)| descriptor.clone())
        .collect();

    debug!(
        "Selected {:?} for category {}",
        selected.iter().map(|d| d.id()).collect::<Vec<_>>(),
        category
    );

    selected
}
