/// Interned message identity: context, source text and disambiguation.
#[salsa::interned]
pub struct MessageKey {
    #[returns(ref)]
    pub context: String,

    #[returns(ref)]
    pub source: String,

    /// Empty when the message has no disambiguation comment.
    #[returns(ref)]
    pub comment: String,
}
