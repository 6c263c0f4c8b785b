//! Static time-API rewrite (`prime_mover::time`, §4.4.5).
//!
//! Entity bodies read more naturally written against a handful of bare
//! functions (`sleep`, `blocking_sleep`, `current_time`,
//! `end_simulation`, `end_simulation_at`) than against an explicit
//! `devi.` receiver. This visitor rewrites those bare calls into method
//! calls against the `devi` parameter every transformed method is
//! given, the same way the teacher crate's `durable-sqlx-macros::Visitor`
//! rewrites bare `sqlx::` paths into the fully qualified form
//! post-expansion — here the rewrite runs pre-expansion, on the method
//! body `#[entity]` is about to emit.
//!
//! `blocking_sleep` maps onto `Devi::advance` rather than a method of
//! its own name: it's the suspending sibling of `sleep` the same way
//! `advance` is the suspending sibling of the non-blocking `Devi::sleep`,
//! so rewriting it to `devi.advance(..)` (missing its `resume` argument)
//! lets [`crate::suspend`]'s existing `advance` recognizer pick it up
//! with no changes of its own.
//!
//! Calls already written against an explicit receiver (`devi.sleep(..)`)
//! are left untouched; only the bare, no-receiver spelling is rewritten,
//! so existing hand-written entity code (written directly against
//! `prime-mover-core`, as in its own test suite) keeps working verbatim.

use syn::visit_mut::{self, VisitMut};
use syn::{Expr, ExprCall, ExprMethodCall, ExprPath};

const REWRITTEN_CALLS: &[(&str, &str)] =
    &[("sleep", "sleep"), ("current_time", "current_time"), ("end_simulation_at", "end_simulation_at"), ("end_simulation", "end_simulation"), ("blocking_sleep", "advance")];

pub struct TimeApiRewriter;

impl VisitMut for TimeApiRewriter {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        visit_mut::visit_expr_mut(self, expr);

        let Expr::Call(ExprCall { func, args, .. }) = expr else { return };
        let Expr::Path(ExprPath { path, qself: None, .. }) = func.as_ref() else { return };
        let Some(name) = path.get_ident().map(ToString::to_string) else { return };
        let Some((_, target_method)) = REWRITTEN_CALLS.iter().find(|(bare, _)| *bare == name) else {
            return;
        };

        let receiver: Expr = syn::parse_quote!(devi);
        let method = syn::Ident::new(target_method, proc_macro2::Span::call_site());
        *expr = Expr::MethodCall(ExprMethodCall {
            attrs: Vec::new(),
            receiver: Box::new(receiver),
            dot_token: Default::default(),
            method,
            turbofish: None,
            paren_token: Default::default(),
            args: args.clone(),
        });
    }
}

pub fn rewrite(block: &mut syn::Block) {
    TimeApiRewriter.visit_block_mut(block);
}
