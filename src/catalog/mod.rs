//! Qt Linguist catalog model, lookup and placeholder utilities.

mod lookup;
mod model;
mod placeholder;
mod plural;

pub use model::{
    Context,
    Location,
    Message,
    MessageRanges,
    Translation,
    TranslationCatalog,
    TranslationKind,
};
pub use placeholder::{
    PlaceholderDiff,
    compare_placeholders,
    extract_placeholders,
    interpolate,
    placeholder_counts,
};
pub use plural::{
    PluralRule,
    plural_form_index,
    plural_form_count,
};
