use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use lazy_core::{eval, Block, BoxedValue, EvaluatorRef, YieldFlag, LAZY_MIN};

fn cons_evaluator() -> EvaluatorRef {
    Rc::new(|_arg: BoxedValue, _y: &YieldFlag| {
        BoxedValue::Ptr(Block::alloc(1, vec![BoxedValue::Immediate(3)]))
    })
}

fn force_unique_leaf(c: &mut Criterion) {
    c.bench_function("force unique leaf", |b| {
        b.iter(|| {
            let thunk = Block::alloc(LAZY_MIN + 1, vec![BoxedValue::Immediate(3)]);
            black_box(eval(BoxedValue::Ptr(thunk), cons_evaluator()).unwrap());
        })
    });
}

fn force_shared_leaf(c: &mut Criterion) {
    c.bench_function("force shared leaf", |b| {
        b.iter(|| {
            let thunk = Block::alloc(LAZY_MIN + 1, vec![BoxedValue::Immediate(3)]);
            let _alias = thunk.clone();
            black_box(eval(BoxedValue::Ptr(thunk), cons_evaluator()).unwrap());
        })
    });
}

fn force_indirection_chain(c: &mut Criterion) {
    c.bench_function("force indirection chain of 100", |b| {
        b.iter(|| {
            let v = Block::alloc(1, vec![BoxedValue::Immediate(42)]);
            let mut chain = BoxedValue::Ptr(v);
            for _ in 0..100 {
                let ind = Block::alloc(lazy_core::LAZY_IND, vec![chain]);
                ind.set_scan_fsize(1);
                chain = BoxedValue::Ptr(ind);
            }
            let evaluator: EvaluatorRef =
                Rc::new(|_arg: BoxedValue, _y: &YieldFlag| unreachable!("no thunk in the chain"));
            black_box(eval(chain, evaluator).unwrap());
        })
    });
}

criterion_group!(
    benches,
    force_unique_leaf,
    force_shared_leaf,
    force_indirection_chain
);
criterion_main!(benches);
