//! Runtime support library injected into every generated program.
//!
//! The ZeptoN environment primitives (console I/O, line input of
//! primitive types, environment and process queries, array-to-string
//! helpers) are plain Java text concatenated into the generated class
//! exactly once, right before the closing class brace. All internal
//! symbols carry the `_$` prefix, which the rewriter forbids in user
//! identifiers, so injected and user-declared names can never collide.

/// Reserved name prefix for injected runtime symbols.
pub const RUNTIME_PREFIX: &str = "_$";

/// Import preamble emitted once per generated unit, on the line of the
/// `package` semicolon or, without a package clause, the `prog` line.
pub const IMPORT_PREAMBLE: &str = "import java.io.*; import java.math.*; \
     import java.nio.charset.*; import java.net.*; import java.util.*;";

/// Catch/finally epilogue replacing the closing brace of the `begin`
/// block: reports an uncaught exception, flushes and closes the
/// runtime I/O handles, and exits the process. Kept to a single line
/// so it cannot shift any later source line.
pub const PROGRAM_EPILOGUE: &str = "} catch(Exception _$ex) { \
     System.out.printf(\"Uncaught ZeptoN Program Exception: '%s' is '%s'.%n\", \
     _$ex.getClass().getName(), _$ex.getMessage()); } finally { _$close(); } \
     System.exit(0);";

/// The predefined environment: constants, internal handles, and the
/// helper methods bound to the reserved words in [`RESERVED_WORDS`].
pub const RUNTIME_SUPPORT: &str = r#"
public static final char[]      EMPTY_CHAR   = new char[0];
public static final String      EMPTY_STRING = new String();
public static final String      EOL          = System.getProperty("line.separator");
public static final char        NULL_CHAR    = Character.MIN_VALUE;

public static       String[]    _$argv       = new String[0];
public static final PrintStream _$out_str    = System.out;
public static final InputStream _$inp_str    = System.in;
public static final PrintStream _$err_str    = System.err;
public static final Console     _$con        = System.console();
public static final Runtime     _$run        = Runtime.getRuntime();
public static final Scanner     _$scan       = new Scanner(System.in);

public static final void _$start(final String[] args){_$argv=args;}
public static final void _$close(){try{ _$out_str.flush();_$out_str.close();_$err_str.flush();_$err_str.close();_$inp_str.close();}catch (Exception ex){_$err_str.println(ex.getMessage());ex.printStackTrace(_$err_str);}}

public static final void    arraycopy(final Object src,final int srcPos,Object dst,final int dstPost,final int len){System.arraycopy(src,srcPos,dst,dstPost,len);}
public static final int     availableProcessors() { return _$run.availableProcessors(); }
public static final String  clearProperty(final String param) { return System.clearProperty(param); }
public static final Console console(){return _$con;}
public static final long    currentTimeMillis(){return System.currentTimeMillis();}
public static final Charset defaultCharset() { return Charset.defaultCharset(); }
public static final void    exit(final int code){ _$run.exit(code);}
public static final long    freeMemory(){return _$run.freeMemory();}
public static final void    gc(){ _$run.gc();}
public static final String  getenv(final String param){return System.getenv(param);}
public static final Locale  getLocale(){return _$scan.locale();}
public static final String  getProperty(final String param){return System.getProperty(param);}
public static final Runtime getRuntime(){return _$run;}
public static final void    halt(final int param) { _$run.halt(param); }
public static final int     identityHashCode(final Object obj){return System.identityHashCode(obj);}
public static final String  lineSeparator() { return System.lineSeparator(); };
public static final long    maxMemory(){return _$run.maxMemory();}
public static final long    nanoTime(){return System.nanoTime();}

public static final BigDecimal readBigDecimal(){return _$scan.nextBigDecimal();}
public static final BigInteger readBigInteger(){return _$scan.nextBigInteger();}
public static final boolean    readBoolean(){return _$scan.nextBoolean();}
public static final byte       readByte(){return _$scan.nextByte();}
public static final char       readChar(){char chr;try{chr = (char) _$inp_str.read();}catch (Exception ex){chr = NULL_CHAR;} return chr;}
public static final double     readDouble(){return _$scan.nextDouble();}
public static final float      readFloat(){return _$scan.nextFloat();}
public static final int        readInt(){return _$scan.nextInt();}
public static final long       readLong(){return _$scan.nextLong();}
public static final short      readShort(){return _$scan.nextShort();}
public static final String     readLine(){String line = EMPTY_STRING;try{line = _$scan.nextLine();}catch (Exception ex){line = EMPTY_STRING;} return line;}
public static final String     readLine(final String fmt, final Object... args){if( _$con==null){return EMPTY_STRING;} return _$con.readLine(fmt,args);}
public static final char[]     readPassword(){if( _$con==null){return EMPTY_CHAR;} return _$con.readPassword();}
public static final char[]     readPassword(String fmt,Object... args){if (_$con==null){return EMPTY_CHAR;} return _$con.readPassword(fmt,args);}
public static final String     readString(){try{return _$scan.next();}catch (Exception ex){_$err_str.println(ex.getMessage());ex.printStackTrace(_$err_str);} return EMPTY_STRING;}

public static final void printf(final String fmt,final Object... param){_$out_str.printf(fmt,param);}
public static final void print(final char[] param){_$out_str.print(param);}
public static final void print(final BigDecimal param){_$out_str.print(param.toPlainString());}
public static final void print(final BigInteger param){_$out_str.print(param.toString());}
public static final void print(final boolean param){_$out_str.print(param);}
public static final void print(final byte param){_$out_str.print(param);}
public static final void print(final char param){_$out_str.print(param);}
public static final void print(final double param){_$out_str.print(param);}
public static final void print(final float param){_$out_str.print(param);}
public static final void print(final int param){_$out_str.print(param);}
public static final void print(final long param){_$out_str.print(param);}
public static final void print(final Object param){_$out_str.print(param);}
public static final void print(final short param){_$out_str.print(param);}
public static final void print(final String param){_$out_str.print(param);}
public static final void println(){_$out_str.println();}
public static final void println(final char[] param){_$out_str.println(param);}
public static final void println(final BigDecimal param){_$out_str.println(param.toPlainString());}
public static final void println(final BigInteger param){_$out_str.println(param.toString());}
public static final void println(final boolean param){_$out_str.println(param);}
public static final void println(final byte param){_$out_str.println(param);}
public static final void println(final char param){_$out_str.println(param);}
public static final void println(final double param){_$out_str.println(param);}
public static final void println(final float param){_$out_str.println(param);}
public static final void println(final int param){_$out_str.println(param);}
public static final void println(final long param){_$out_str.println(param);}
public static final void println(final Object param){_$out_str.println(param);}
public static final void println(final short param){_$out_str.println(param);}
public static final void println(final String param){_$out_str.println(param);}

public static final String setProperty(final String key, final String value) { return System.setProperty(key, value); }
public static final long   totalMemory(){return _$run.totalMemory();}

public static final String toString(final boolean[] param){return Arrays.toString(param);}
public static final String toString(final byte[] param){return Arrays.toString(param);}
public static final String toString(final char[] param){return Arrays.toString(param);}
public static final String toString(final double[] param){return Arrays.toString(param);}
public static final String toString(final float[] param){return Arrays.toString(param);}
public static final String toString(final int[] param){return Arrays.toString(param);}
public static final String toString(final long[] param){return Arrays.toString(param);}
public static final String toString(final short[] param){return Arrays.toString(param);}
public static final String toString(final Object[] param){return Arrays.toString(param);}
public static final String valueOf(final char[] param){return String.valueOf(param);}

public static final String[] getArgs(){return _$argv;}
public static final void     errorf(final String fmt,final Object...param){_$err_str.printf(fmt,param);}
public static final void     nop(){;}
"#;

/// Names bound by the runtime support library, kept sorted for binary
/// search. Editor collaborators consult this table to classify the
/// environment words.
pub const RESERVED_WORDS: &[&str] = &[
    "EMPTY_CHAR",
    "EMPTY_STRING",
    "EOL",
    "NULL_CHAR",
    "arraycopy",
    "availableProcessors",
    "clearProperty",
    "console",
    "currentTimeMillis",
    "defaultCharset",
    "errorf",
    "exit",
    "freeMemory",
    "gc",
    "getArgs",
    "getLocale",
    "getProperty",
    "getRuntime",
    "getenv",
    "halt",
    "identityHashCode",
    "lineSeparator",
    "maxMemory",
    "nanoTime",
    "nop",
    "print",
    "printf",
    "println",
    "readBigDecimal",
    "readBigInteger",
    "readBoolean",
    "readByte",
    "readChar",
    "readDouble",
    "readFloat",
    "readInt",
    "readLine",
    "readLong",
    "readPassword",
    "readShort",
    "readString",
    "setProperty",
    "toString",
    "totalMemory",
    "valueOf",
];

/// True if `word` is one of the predefined environment names.
pub fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.binary_search(&word).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_table_is_sorted() {
        assert!(RESERVED_WORDS.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn classifies_environment_words() {
        assert!(is_reserved("println"));
        assert!(is_reserved("readInt"));
        assert!(is_reserved("EMPTY_STRING"));
        assert!(!is_reserved("frobnicate"));
        assert!(!is_reserved("prog"));
    }

    #[test]
    fn every_reserved_word_appears_in_the_support_text() {
        for word in RESERVED_WORDS {
            assert!(
                RUNTIME_SUPPORT.contains(word),
                "runtime support is missing '{word}'"
            );
        }
    }

    #[test]
    fn internal_symbols_use_the_runtime_prefix() {
        for symbol in ["_$argv", "_$start", "_$close", "_$scan"] {
            assert!(symbol.starts_with(RUNTIME_PREFIX));
            assert!(RUNTIME_SUPPORT.contains(symbol));
        }
        assert!(PROGRAM_EPILOGUE.contains("_$close();"));
        assert!(PROGRAM_EPILOGUE.contains("System.exit(0);"));
    }
}
