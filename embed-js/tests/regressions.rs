use embed_js::{Context, Error, Value};

#[test]
fn reduce_through_tail_calls_keeps_caller_frames() -> Result<(), Error> {
  let mut ctx = Context::new()?;
  let value = ctx.evaluate(
    "var reduce = function(obj, iterator, memo) {
       return obj.reduce(iterator, memo);
     };

     function replace(array, shallow) {
       return reduce(array, function(memo, value) {
         return memo.concat(shallow);
       }, []);
     }

     JSON.stringify(replace([1, 2], 1));",
    "regressions.js",
  )?;
  assert_eq!(value, Value::from("[1,1]"));
  Ok(())
}

#[test]
fn bound_constructors_can_be_newed() -> Result<(), Error> {
  let mut ctx = Context::new()?;
  let value = ctx.evaluate(
    "function Thing(value) {
       this.value = value;
     }

     one = Thing.bind(null, 1);
     var obj = new one;
     obj.value;",
    "regressions.js",
  )?;
  assert_eq!(value, Value::Number(1.0));
  Ok(())
}
