//! Executor facade: runs a target operation against declarative fixtures
//! and reports verification failures.
//!
//! Each test case generates the operation's arguments from its `init`
//! specification (registering every argument under its assignment name for
//! `reference` reuse), invokes the operation, wraps the arguments and the
//! result into an execution record, and verifies that record against the
//! case's `verify` specification. A rendered report is empty exactly when
//! everything passed.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use fixwright_core::{
    AssignmentMark, ClassId, Context, EngineConfig, ExecutionVerifier, ObjectGenerator, ParamNode,
    TypeExpr, Value, VerificationResult,
};

/// Field name the operation result is exposed under in the execution
/// record.
pub const RESULT_FIELD: &str = "result";

/// One declared parameter of the operation under test, addressed from
/// specifications by its assignment name.
#[derive(Clone, Debug)]
pub struct ParamSpec {
    pub name: String,
    pub ty: TypeExpr,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// The operation under test: a name plus its parameter list.
#[derive(Clone, Debug)]
pub struct MethodSpec {
    pub name: String,
    pub params: Vec<ParamSpec>,
}

impl MethodSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.params.push(ParamSpec::new(name, ty));
        self
    }
}

/// A fault thrown by the operation under test; reported as a distinct,
/// unverified failure line.
#[derive(Clone, Debug)]
pub struct OperationFault {
    pub reason: String,
}

impl OperationFault {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The target operation: receives the generated arguments, returns its
/// result or a fault.
pub type Operation<'a> = dyn Fn(&[Value]) -> Result<Value, OperationFault> + 'a;

/// One declarative test case: generation and verification specifications,
/// with an optional seed for deterministic generation.
#[derive(Clone, Debug, Default)]
pub struct TestCase {
    pub name: String,
    pub init: Option<ParamNode>,
    pub verify: Option<ParamNode>,
    pub seed: Option<u64>,
}

impl TestCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_init(mut self, init: ParamNode) -> Self {
        self.init = Some(init);
        self
    }

    pub fn with_verify(mut self, verify: ParamNode) -> Self {
        self.verify = Some(verify);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Everything observed while running one case.
#[derive(Debug)]
pub struct CaseOutcome {
    pub name: String,
    /// Every per-path verification result, passed or failed.
    pub results: Vec<VerificationResult>,
    /// Rendered failure lines: failed verifications, generation errors and
    /// operation faults.
    pub failures: Vec<String>,
    /// Deferred assignments recorded during generation, for the caller to
    /// resolve externally.
    pub assignments: Vec<AssignmentMark>,
}

impl CaseOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcomes of a batch of cases.
#[derive(Debug, Default)]
pub struct Report {
    pub outcomes: Vec<CaseOutcome>,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(CaseOutcome::is_success)
    }

    /// One line per failure, newline-terminated; empty on full success.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            for line in &outcome.failures {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

/// Runs declarative test cases against a target operation.
pub struct Executor {
    generator: ObjectGenerator,
    verifier: ExecutionVerifier,
}

impl Executor {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            generator: ObjectGenerator::new(config.clone()),
            verifier: ExecutionVerifier::new(config),
        }
    }

    /// Runs every case, collecting per-case outcomes.
    pub fn run_cases(
        &self,
        method: &MethodSpec,
        operation: &Operation<'_>,
        cases: &[TestCase],
    ) -> Report {
        let outcomes = cases
            .iter()
            .map(|case| self.run_case(method, operation, case))
            .collect();
        Report { outcomes }
    }

    /// Runs one case: generate, invoke, verify.
    pub fn run_case(
        &self,
        method: &MethodSpec,
        operation: &Operation<'_>,
        case: &TestCase,
    ) -> CaseOutcome {
        debug!("running case '{}' of '{}'", case.name, method.name);
        let root = case.init.clone().map(Arc::new);
        let mut ctx = match case.seed {
            Some(seed) => Context::with_seed(root, seed),
            None => Context::new(root),
        };

        let mut args = Vec::with_capacity(method.params.len());
        for param in &method.params {
            ctx.enter("args", param.name.clone());
            let generated = self
                .generator
                .generate(&param.ty, &mut ctx)
                .and_then(|value| {
                    ctx.leave(&value);
                    ctx.register_reference(&param.name, value.clone())?;
                    Ok(value)
                });
            match generated {
                Ok(value) => args.push(value),
                Err(error) => {
                    return self.fatal_outcome(
                        case,
                        &ctx,
                        format!("{}.{}: {error}", method.name, case.name),
                    );
                }
            }
        }

        let result = match operation(&args) {
            Ok(result) => result,
            Err(fault) => {
                return self.fatal_outcome(
                    case,
                    &ctx,
                    format!("{}.{}: {}", method.name, case.name, fault.reason),
                );
            }
        };

        let mut fields = BTreeMap::new();
        for (param, value) in method.params.iter().zip(&args) {
            fields.insert(param.name.clone(), value.clone());
        }
        fields.insert(RESULT_FIELD.to_string(), result);
        let record = Value::object(ClassId::OBJECT, fields);

        let results = self
            .verifier
            .verify(&method.name, &record, case.verify.as_ref());
        let failures = results
            .iter()
            .filter(|result| !result.is_success())
            .map(ToString::to_string)
            .collect();
        CaseOutcome {
            name: case.name.clone(),
            results,
            failures,
            assignments: ctx.assignments().to_vec(),
        }
    }

    fn fatal_outcome(&self, case: &TestCase, ctx: &Context, line: String) -> CaseOutcome {
        CaseOutcome {
            name: case.name.clone(),
            results: Vec::new(),
            failures: vec![line],
            assignments: ctx.assignments().to_vec(),
        }
    }
}
