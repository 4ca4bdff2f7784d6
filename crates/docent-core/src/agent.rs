/// States of the routed answering flow.
///
/// `Start` always moves to `CheckRelevance`, which branches on the router
/// verdict. Retrieval always proceeds to synthesis, even with an empty
/// context, and both reply paths end in `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Start,
    CheckRelevance,
    Retrieve,
    SynthesizeFromContext,
    GenericReply,
    Done,
}

impl AgentState {
    /// `relevant` is only consulted when leaving `CheckRelevance`.
    #[must_use]
    pub fn next(self, relevant: bool) -> Self {
        match self {
            Self::Start => Self::CheckRelevance,
            Self::CheckRelevance if relevant => Self::Retrieve,
            Self::CheckRelevance => Self::GenericReply,
            Self::Retrieve => Self::SynthesizeFromContext,
            Self::SynthesizeFromContext | Self::GenericReply | Self::Done => Self::Done,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Done
    }
}
