//! Preconditions: boolean gates consulted before an axiom judges a pair.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::AxiomError;
use crate::preference::{approximately_equal, MaskMatrix};
use crate::text::{TermTokenizer, TextContents, TextToolkit};

/// Shared handle to a type-erased precondition.
pub type DynPrecondition<I, O> = Arc<dyn Precondition<I, O>>;

/// Whether an axiom should judge a given pair at all.
pub trait Precondition<I, O>: Send + Sync {
    fn precondition(&self, input: &I, output1: &O, output2: &O) -> Result<bool, AxiomError>;

    /// All-pairs mask; the default expands [`Precondition::precondition`].
    fn preconditions(&self, input: &I, outputs: &[O]) -> Result<MaskMatrix, AxiomError> {
        let n = outputs.len();
        let mut mask = MaskMatrix::from_element(n, n, false);
        for i in 0..n {
            for j in 0..n {
                mask[(i, j)] = self.precondition(input, &outputs[i], &outputs[j])?;
            }
        }
        Ok(mask)
    }

    fn name(&self) -> String {
        crate::axiom::short_type_name::<Self>()
    }
}

/// True when both outputs' term counts are within `margin_fraction` of each other.
pub struct LengthEqual {
    tokenizer: Arc<dyn TermTokenizer>,
    margin_fraction: f64,
}

impl LengthEqual {
    pub fn new(tokenizer: Arc<dyn TermTokenizer>, margin_fraction: f64) -> Self {
        Self {
            tokenizer,
            margin_fraction,
        }
    }

    /// Tokenizer and margin taken from the toolkit.
    pub fn from_toolkit(toolkit: &TextToolkit) -> Self {
        Self::new(toolkit.term_tokenizer.clone(), toolkit.margin_fraction)
    }

    fn length<T: TextContents>(&self, entity: &T) -> f64 {
        self.tokenizer.terms(&entity.contents()).len() as f64
    }
}

impl<I, O> Precondition<I, O> for LengthEqual
where
    O: TextContents,
{
    fn precondition(&self, _input: &I, output1: &O, output2: &O) -> Result<bool, AxiomError> {
        Ok(approximately_equal(
            self.length(output1),
            self.length(output2),
            self.margin_fraction,
        ))
    }

    fn preconditions(&self, _input: &I, outputs: &[O]) -> Result<MaskMatrix, AxiomError> {
        let lengths: Vec<f64> = outputs.iter().map(|o| self.length(o)).collect();
        let n = lengths.len();
        Ok(MaskMatrix::from_fn(n, n, |i, j| {
            approximately_equal(lengths[i], lengths[j], self.margin_fraction)
        }))
    }

    fn name(&self) -> String {
        "LEN".to_string()
    }
}

/// Precondition backed by a closure.
pub struct FnPrecondition<I, O, F> {
    label: String,
    f: F,
    _marker: PhantomData<fn(&I, &O)>,
}

impl<I, O, F> FnPrecondition<I, O, F>
where
    F: Fn(&I, &O, &O) -> bool + Send + Sync,
{
    pub fn new(label: impl Into<String>, f: F) -> Self {
        Self {
            label: label.into(),
            f,
            _marker: PhantomData,
        }
    }
}

impl<I, O, F> Precondition<I, O> for FnPrecondition<I, O, F>
where
    F: Fn(&I, &O, &O) -> bool + Send + Sync,
{
    fn precondition(&self, input: &I, output1: &O, output2: &O) -> Result<bool, AxiomError> {
        Ok((self.f)(input, output1, output2))
    }

    fn name(&self) -> String {
        self.label.clone()
    }
}
