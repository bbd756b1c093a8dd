//! Property tests for type enforcement.

use std::sync::Arc;

use featgen_transform::{FeatureGenerator, MemorySink, TypeEnforcementStage};
use polars::df;
use polars::prelude::{DataFrame, DataType};
use proptest::prelude::*;

fn frame(ints: &[i16], floats: &[f32]) -> DataFrame {
    df!("i" => ints, "f" => floats).unwrap()
}

fn rows() -> impl Strategy<Value = (Vec<i16>, Vec<f32>)> {
    (1usize..32).prop_flat_map(|len| {
        (
            prop::collection::vec(any::<i16>(), len),
            prop::collection::vec(-1.0e6f32..1.0e6, len),
        )
    })
}

proptest! {
    #[test]
    fn enforcement_is_idempotent((train_i, train_f) in rows(), (ints, floats) in rows()) {
        let sink = Arc::new(MemorySink::new());
        let mut stage = TypeEnforcementStage::new(sink.clone());
        stage.fit(frame(&train_i, &train_f), None).unwrap();

        let once = stage.transform(&frame(&ints, &floats)).unwrap();
        let twice = stage.transform(&once).unwrap();

        prop_assert!(once.equals(&twice));
        prop_assert_eq!(once.column("i").unwrap().dtype(), &DataType::Int16);
        prop_assert_eq!(once.column("f").unwrap().dtype(), &DataType::Float32);
        prop_assert!(sink.warnings().is_empty());
    }

    #[test]
    fn repaired_int_columns_have_no_nulls(values in prop::collection::vec(prop::option::of(any::<i32>()), 1..32)) {
        let sink = Arc::new(MemorySink::new());
        let mut stage = TypeEnforcementStage::new(sink.clone());
        stage.fit(df!("i" => [1i32, 2]).unwrap(), None).unwrap();

        let nulls = values.iter().filter(|value| value.is_none()).count();
        let output = stage.transform(&df!("i" => values.clone()).unwrap()).unwrap();

        prop_assert_eq!(output.column("i").unwrap().null_count(), 0);
        prop_assert_eq!(output.column("i").unwrap().dtype(), &DataType::Int32);
        prop_assert_eq!(sink.warnings().len(), usize::from(nulls > 0));
    }
}
